//! Shared test helpers for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use helpline_core::error::ProviderError;
use helpline_core::message::ChatMessage;
use helpline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use helpline_core::{
    ContextCatalog, ContextSchema, CustomerContextStore, FieldMap, KnowledgeEntry, KnowledgeIndex,
};

/// One scripted outcome of a completion call.
pub enum Scripted {
    Reply(String),
    Fail(ProviderError),
    /// Sleep, then fail with `Timeout`.
    Hang(Duration),
}

/// A mock provider that replays scripted outcomes in order and records
/// every request it receives.
///
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers each call with the given texts, in order.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Scripted::Reply(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// System prompt of the n-th request.
    pub fn system_prompt(&self, n: usize) -> String {
        self.requests()[n].messages[0].content.clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(make_text_response(&text)),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Err(ProviderError::Timeout(format!(
                    "no response after {}ms",
                    delay.as_millis()
                )))
            }
            None => panic!(
                "ScriptedProvider: no more outcomes (call #{})",
                self.call_count()
            ),
        }
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: ChatMessage::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Telecom knowledge with two categories.
pub fn telecom_knowledge() -> KnowledgeIndex {
    KnowledgeIndex::new(vec![
        KnowledgeEntry::new(
            Some("balance"),
            Some("Check balance"),
            "What is my balance?",
            "Your current balance is shown in the app.",
        ),
        KnowledgeEntry::new(
            Some("loans"),
            Some("Active loan"),
            "Do I have an active loan?",
            "Let me check your loan details.",
        ),
        KnowledgeEntry::new(
            Some("loans"),
            Some("Outstanding amount"),
            "How much do I still owe?",
            "Your outstanding amount is in your loan summary.",
        ),
    ])
}

/// Knowledge with a single category.
pub fn single_category_knowledge() -> KnowledgeIndex {
    KnowledgeIndex::new(vec![KnowledgeEntry::new(
        Some("general"),
        Some("Check balance"),
        "What is my balance?",
        "Your current balance is shown in the app.",
    )])
}

pub fn telecom_catalog() -> ContextCatalog {
    ContextCatalog::new(vec![
        ContextSchema::new("balance_and_usage", "Prepaid balance and data usage")
            .with_field("balance", "Current main balance")
            .with_field("data_remaining", "Data left today")
            .with_example("What is my balance?"),
        ContextSchema::new("loans", "Device loans and bill advances")
            .with_field("has_active_loan", "Whether a loan is active")
            .with_field("outstanding_amount", "Amount still owed")
            .with_example("Do I have an active loan?"),
    ])
    .unwrap()
}

pub fn telecom_customer() -> CustomerContextStore {
    let mut store = CustomerContextStore::new();
    store.put_context(
        "balance_and_usage",
        FieldMap::from_iter([("balance", "₹47"), ("data_remaining", "1.2 GB")]),
    );
    store.put_context(
        "loans",
        FieldMap::from_iter([("has_active_loan", "true"), ("outstanding_amount", "₹4,200")]),
    );
    store
}
