//! Error types for the Helpline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// Invalid context catalog contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("context schema with a blank name")]
    BlankName,

    #[error("duplicate context name '{0}'")]
    DuplicateName(String),
}

// --- Bounded context errors ---

/// Failures of a single completion call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a success status but the payload had no
    /// generated text in it.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Which of the three completion calls of a routed query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    CategoryClassification,
    ContextClassification,
    Answer,
}

impl std::fmt::Display for CallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryClassification => write!(f, "category classification"),
            Self::ContextClassification => write!(f, "context classification"),
            Self::Answer => write!(f, "answer"),
        }
    }
}

/// Errors surfaced by the router. A classification that matches no label is
/// a normal outcome and never appears here.
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    #[error("Completion service failed during {stage}: {source}")]
    ClassificationTransport {
        stage: CallStage,
        #[source]
        source: ProviderError,
    },

    #[error("Completion service failed during answer: {0}")]
    AnswerTransport(#[source] ProviderError),

    #[error("Malformed completion response during {stage}: {message}")]
    MalformedServiceResponse { stage: CallStage, message: String },
}

impl RoutingError {
    /// Classify a provider failure by the call that produced it.
    pub fn from_provider(stage: CallStage, error: ProviderError) -> Self {
        match (stage, error) {
            (stage, ProviderError::MalformedResponse(message)) => {
                Self::MalformedServiceResponse { stage, message }
            }
            (CallStage::Answer, error) => Self::AnswerTransport(error),
            (stage, source) => Self::ClassificationTransport { stage, source },
        }
    }

    /// Short machine-readable code that is safe to show to end users.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Self::ClassificationTransport { .. } => "classification_unavailable",
            Self::AnswerTransport(_) => "answer_unavailable",
            Self::MalformedServiceResponse { .. } => "malformed_response",
        }
    }
}
