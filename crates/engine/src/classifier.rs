//! LLM-backed classification of a question into a knowledge category and a
//! customer-data context.
//!
//! Both classifications are single-turn calls at temperature 0 with a tiny
//! output budget. The reply is expected to be exactly one label; it is
//! trimmed and matched case-insensitively against the known labels. A reply
//! that matches nothing is a normal outcome (`None`), while a failed call is
//! an error.

use std::sync::Arc;

use helpline_core::error::{CallStage, RoutingError};
use helpline_core::message::ChatMessage;
use helpline_core::provider::{Provider, ProviderRequest};
use helpline_core::{Category, ContextCatalog, ConversationWindow};
use tracing::debug;

/// Messages of history folded into the classification query by default.
pub const DEFAULT_LOOKBACK: usize = 4;

/// Build the text both classifiers see.
///
/// With an empty window this is the question itself. Otherwise the last
/// `lookback` messages are prepended so that follow-ups like "What is the
/// amount?" classify like the question they follow. `lookback` is rounded
/// down to whole exchanges (at least one), so the history always starts
/// with a user message.
pub fn classification_query(query: &str, window: &ConversationWindow, lookback: usize) -> String {
    if window.is_empty() {
        return query.to_string();
    }

    let lookback = (lookback / 2).max(1) * 2;
    let mut out = String::from("Recent conversation:\n");
    for m in window.recent(lookback) {
        out.push_str(&format!("{}: {}\n", m.role, m.content));
    }
    out.push_str(&format!("\nCurrent question: {query}"));
    out
}

/// System prompt for category classification.
pub fn category_prompt(categories: &[Category]) -> String {
    let mut prompt = String::from(
        "You are a classifier. For the customer message, reply with exactly one category name \
         from the list below.\n\n",
    );
    for c in categories {
        prompt.push_str(&format!("Category: {}\n", c.name));
        prompt.push_str(&format!("Issues: {}\n\n", c.issues.join(", ")));
    }
    prompt.push_str("Reply with only the category name, nothing else.");
    prompt
}

/// System prompt for context classification. Carries the full catalog.
pub fn context_prompt(catalog: &ContextCatalog) -> String {
    let mut prompt = String::from(
        "You are a classifier. The customer will ask a question. Reply with exactly one context \
         name from the list below: the context (table of customer data) that best matches the \
         question.\n\n",
    );
    prompt.push_str(&catalog.full_prompt_section());
    prompt.push_str("Reply with only the context name, nothing else.");
    prompt
}

/// Match a classifier reply against known labels. The reply is trimmed and
/// compared case-insensitively; the first matching label wins.
pub fn match_label<'a>(reply: &str, labels: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    let reply = reply.to_lowercase();
    labels.into_iter().find(|l| l.to_lowercase() == reply)
}

/// Issues the two constrained classification calls.
pub struct Classifier {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Classifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 30,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Pick the category for `query`.
    ///
    /// No call is made for zero categories (`None`) or exactly one (that
    /// category).
    pub async fn classify_category(
        &self,
        query: &str,
        categories: &[Category],
    ) -> Result<Option<String>, RoutingError> {
        match categories {
            [] => return Ok(None),
            [only] => return Ok(Some(only.name.clone())),
            _ => {}
        }

        let reply = self
            .ask(CallStage::CategoryClassification, category_prompt(categories), query)
            .await?;
        let matched = match_label(&reply, categories.iter().map(|c| c.name.as_str()));
        debug!(reply = %reply.trim(), matched = ?matched, "Category classification");
        Ok(matched.map(String::from))
    }

    /// Pick the customer-data context for `query`. No call for an empty
    /// catalog.
    pub async fn classify_context(
        &self,
        query: &str,
        catalog: &ContextCatalog,
    ) -> Result<Option<String>, RoutingError> {
        if catalog.is_empty() {
            return Ok(None);
        }

        let reply = self
            .ask(CallStage::ContextClassification, context_prompt(catalog), query)
            .await?;
        let matched = match_label(&reply, catalog.names());
        debug!(reply = %reply.trim(), matched = ?matched, "Context classification");
        Ok(matched.map(String::from))
    }

    async fn ask(
        &self,
        stage: CallStage,
        system_prompt: String,
        query: &str,
    ) -> Result<String, RoutingError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(query)],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| RoutingError::from_provider(stage, e))?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use helpline_core::ProviderError;

    fn classifier(provider: &Arc<ScriptedProvider>) -> Classifier {
        Classifier::new(provider.clone(), "gpt-4o-mini")
    }

    #[test]
    fn empty_window_query_is_the_question() {
        let window = ConversationWindow::default();
        assert_eq!(
            classification_query("What is my balance?", &window, DEFAULT_LOOKBACK),
            "What is my balance?"
        );
    }

    #[test]
    fn follow_up_query_carries_recent_conversation() {
        let mut window = ConversationWindow::default();
        window.push_exchange("Do I have an active loan?", "Yes, you have a device loan.");
        let query = classification_query("What is the amount?", &window, DEFAULT_LOOKBACK);
        assert_eq!(
            query,
            "Recent conversation:\n\
             user: Do I have an active loan?\n\
             assistant: Yes, you have a device loan.\n\
             \n\
             Current question: What is the amount?"
        );
    }

    #[test]
    fn lookback_limits_history() {
        let mut window = ConversationWindow::default();
        for i in 1..=3 {
            window.push_exchange(format!("q{i}"), format!("a{i}"));
        }
        let query = classification_query("next", &window, 4);
        assert!(!query.contains("q1"));
        assert!(query.contains("user: q2\nassistant: a2\nuser: q3\nassistant: a3\n"));
    }

    #[test]
    fn odd_lookback_keeps_whole_exchanges() {
        let mut window = ConversationWindow::default();
        for i in 1..=3 {
            window.push_exchange(format!("q{i}"), format!("a{i}"));
        }
        let query = classification_query("next", &window, 3);
        assert_eq!(
            query,
            "Recent conversation:\nuser: q3\nassistant: a3\n\nCurrent question: next"
        );

        let query = classification_query("next", &window, 1);
        assert!(query.starts_with("Recent conversation:\nuser: q3\nassistant: a3\n"));
    }

    #[test]
    fn labels_match_trimmed_and_case_insensitive() {
        let labels = ["balance_and_usage", "loans"];
        assert_eq!(match_label("loans", labels), Some("loans"));
        assert_eq!(match_label("Loans ", labels), Some("loans"));
        assert_eq!(match_label("\nLOANS\n", labels), Some("loans"));
        assert_eq!(match_label("billing", labels), None);
        assert_eq!(match_label("   ", labels), None);
        assert_eq!(match_label("loans.", labels), None);
    }

    #[test]
    fn category_prompt_lists_issues() {
        let prompt = category_prompt(&telecom_knowledge().categories());
        assert!(prompt.contains("Category: loans\nIssues: Active loan, Outstanding amount\n"));
        assert!(prompt.ends_with("Reply with only the category name, nothing else."));
    }

    #[test]
    fn context_prompt_carries_full_catalog() {
        let prompt = context_prompt(&telecom_catalog());
        assert!(prompt.contains("### Context: balance_and_usage"));
        assert!(prompt.contains("### Context: loans"));
        assert!(prompt.contains("has_active_loan"));
    }

    #[tokio::test]
    async fn context_reply_matched_against_catalog() {
        let catalog = telecom_catalog();
        for (reply, expected) in [
            ("loans", Some("loans")),
            ("Loans ", Some("loans")),
            ("billing", None),
        ] {
            let provider = Arc::new(ScriptedProvider::replies(&[reply]));
            let result = classifier(&provider)
                .classify_context("Do I have an active loan?", &catalog)
                .await
                .unwrap();
            assert_eq!(result.as_deref(), expected);
        }
    }

    #[tokio::test]
    async fn classification_request_shape() {
        let provider = Arc::new(ScriptedProvider::replies(&["balance"]));
        let result = classifier(&provider)
            .with_max_tokens(12)
            .classify_category("What is my balance?", &telecom_knowledge().categories())
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("balance"));

        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1], ChatMessage::user("What is my balance?"));
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, Some(12));
    }

    #[tokio::test]
    async fn zero_categories_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::replies(&[]));
        let result = classifier(&provider).classify_category("hi", &[]).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn single_category_chosen_without_call() {
        let provider = Arc::new(ScriptedProvider::replies(&[]));
        let categories = single_category_knowledge().categories();
        let result = classifier(&provider)
            .classify_category("What is my balance?", &categories)
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("general"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_catalog_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::replies(&[]));
        let result = classifier(&provider)
            .classify_context("hi", &ContextCatalog::default())
            .await
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failures_propagate_with_stage() {
        let provider = Arc::new(ScriptedProvider::new(vec![Scripted::Fail(
            ProviderError::Network("connection refused".into()),
        )]));
        let err = classifier(&provider)
            .classify_context("hi", &telecom_catalog())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RoutingError::ClassificationTransport {
                stage: CallStage::ContextClassification,
                ..
            }
        ));

        let provider = Arc::new(ScriptedProvider::new(vec![Scripted::Fail(
            ProviderError::MalformedResponse("no choices".into()),
        )]));
        let err = classifier(&provider)
            .classify_category("hi", &telecom_knowledge().categories())
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::MalformedServiceResponse { .. }));
    }
}
