//! The query router: two classifications, one answer.

use std::sync::Arc;

use helpline_config::{AppConfig, ConfigError};
use helpline_core::error::{CallStage, RoutingError};
use helpline_core::message::ChatMessage;
use helpline_core::provider::{Provider, ProviderRequest};
use helpline_core::{ContextCatalog, ConversationWindow, CustomerData, KnowledgeIndex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, DEFAULT_LOOKBACK, classification_query};
use crate::prompt::PromptAssembler;
use crate::session::SessionStore;

/// Model and sampling settings for the three calls of a routed query.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub model: String,
    pub answer_temperature: f32,
    pub answer_max_tokens: u32,
    pub classifier_temperature: f32,
    pub classifier_max_tokens: u32,
    /// Messages of history used for classification
    pub lookback: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            answer_temperature: 0.3,
            answer_max_tokens: 256,
            classifier_temperature: 0.0,
            classifier_max_tokens: 30,
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            answer_temperature: config.answer.temperature,
            answer_max_tokens: config.answer.max_tokens,
            classifier_temperature: config.classifier.temperature,
            classifier_max_tokens: config.classifier.max_tokens,
            lookback: config.history.classification_lookback,
        }
    }
}

/// Everything decided before the answer call.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingPlan {
    /// Text both classifiers saw
    pub classification_query: String,
    /// Matched knowledge category, if any
    pub category: Option<String>,
    /// Matched customer-data context, if any
    pub context: Option<String>,
    /// Entries of the knowledge index the prompt was built from
    pub knowledge_entries: usize,
    pub system_prompt: String,
}

/// An answer together with the routing decision that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedAnswer {
    pub answer: String,
    pub plan: RoutingPlan,
}

pub struct Router {
    provider: Arc<dyn Provider>,
    knowledge: Arc<KnowledgeIndex>,
    catalog: Arc<ContextCatalog>,
    customer: Arc<dyn CustomerData>,
    classifier: Classifier,
    assembler: PromptAssembler,
    settings: RouterSettings,
}

impl Router {
    /// Create a router with default settings and prompt text.
    pub fn new(
        provider: Arc<dyn Provider>,
        knowledge: Arc<KnowledgeIndex>,
        catalog: Arc<ContextCatalog>,
        customer: Arc<dyn CustomerData>,
    ) -> Self {
        let settings = RouterSettings::default();
        Self {
            classifier: Self::classifier_for(&provider, &settings),
            provider,
            knowledge,
            catalog,
            customer,
            assembler: PromptAssembler::default(),
            settings,
        }
    }

    /// Create a router using the model, sampling and prompt settings of
    /// `config`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        knowledge: Arc<KnowledgeIndex>,
        catalog: Arc<ContextCatalog>,
        customer: Arc<dyn CustomerData>,
    ) -> Self {
        Self::new(provider, knowledge, catalog, customer)
            .with_settings(RouterSettings::from_config(config))
            .with_assembler(PromptAssembler::from_config(&config.prompt))
    }

    /// Load the knowledge, catalog and customer data files named in
    /// `config` and build a router around `provider`.
    pub fn load(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Self, ConfigError> {
        let knowledge = helpline_config::load_knowledge(&config.data.knowledge_path)?;
        let catalog = helpline_config::load_catalog(&config.data.catalog_path)?;
        let customer =
            helpline_config::load_customer_data(config.data.customer_data_path.as_deref())?;

        Ok(Self::from_config(
            config,
            provider,
            Arc::new(knowledge),
            Arc::new(catalog),
            Arc::new(customer),
        ))
    }

    pub fn with_settings(mut self, settings: RouterSettings) -> Self {
        self.classifier = Self::classifier_for(&self.provider, &settings);
        self.settings = settings;
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    fn classifier_for(provider: &Arc<dyn Provider>, settings: &RouterSettings) -> Classifier {
        Classifier::new(provider.clone(), settings.model.clone())
            .with_temperature(settings.classifier_temperature)
            .with_max_tokens(settings.classifier_max_tokens)
    }

    pub fn knowledge(&self) -> &KnowledgeIndex {
        &self.knowledge
    }

    pub fn catalog(&self) -> &ContextCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Classify and assemble the system prompt without answering.
    pub async fn plan(
        &self,
        query: &str,
        window: &ConversationWindow,
    ) -> Result<RoutingPlan, RoutingError> {
        let classification_query = classification_query(query, window, self.settings.lookback);

        let category = self
            .classifier
            .classify_category(&classification_query, &self.knowledge.categories())
            .await?;

        let narrowed = category.as_deref().map(|c| self.knowledge.for_category(c));
        let knowledge = match &narrowed {
            Some(index) if !index.is_empty() => index,
            Some(_) => {
                debug!(category = ?category, "Category has no entries; using full knowledge");
                self.knowledge.as_ref()
            }
            None => {
                debug!("No category matched; using full knowledge");
                self.knowledge.as_ref()
            }
        };

        let context = self
            .classifier
            .classify_context(&classification_query, &self.catalog)
            .await?;
        if context.is_none() {
            debug!("No context matched; answering without customer data");
        }

        let customer_section = context
            .as_deref()
            .map(|c| self.customer.prompt_section_for_context(c))
            .unwrap_or_default();

        let system_prompt = self.assembler.build(
            knowledge,
            &self.catalog,
            context.as_deref(),
            &customer_section,
        );

        Ok(RoutingPlan {
            classification_query,
            knowledge_entries: knowledge.len(),
            category,
            context,
            system_prompt,
        })
    }

    /// Answer `query` and return the routing decision alongside.
    ///
    /// On success the exchange is appended to `window`; on any error the
    /// window is left exactly as it was.
    pub async fn answer_detailed(
        &self,
        query: &str,
        window: &mut ConversationWindow,
    ) -> Result<RoutedAnswer, RoutingError> {
        let plan = self.plan(query, window).await?;

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatMessage::system(plan.system_prompt.clone()));
        messages.extend(window.messages().iter().cloned());
        messages.push(ChatMessage::user(query));

        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.answer_temperature,
            max_tokens: Some(self.settings.answer_max_tokens),
        };

        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(error = %e, "Answer call failed");
            RoutingError::from_provider(CallStage::Answer, e)
        })?;

        let answer = response.message.content.trim().to_string();
        window.push_exchange(query, answer.clone());

        info!(
            category = plan.category.as_deref().unwrap_or("-"),
            context = plan.context.as_deref().unwrap_or("-"),
            history = window.len(),
            "Answered query"
        );

        Ok(RoutedAnswer { answer, plan })
    }

    /// Answer `query` in the conversation held by `window`.
    pub async fn answer(
        &self,
        query: &str,
        window: &mut ConversationWindow,
    ) -> Result<String, RoutingError> {
        self.answer_detailed(query, window)
            .await
            .map(|routed| routed.answer)
    }

    /// Answer within a registered session. The session's window stays
    /// locked for the whole pipeline, so concurrent queries on one session
    /// run one after another.
    pub async fn answer_in_session(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        query: &str,
    ) -> Result<RoutedAnswer, RoutingError> {
        let window = sessions.window(session_id).await;
        let mut window = window.lock().await;
        self.answer_detailed(query, &mut window).await
    }
}
