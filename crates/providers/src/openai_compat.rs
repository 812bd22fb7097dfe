//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and any endpoint exposing
//! `POST {base}/chat/completions`. Only non-streaming completions are used:
//! every call the router makes needs the full text before it can continue.

use std::time::Duration;

use async_trait::async_trait;
use helpline_core::error::ProviderError;
use helpline_core::message::{ChatMessage, Role};
use helpline_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

/// HTTP client timeouts.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with default timeouts.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::with_timeouts(name, base_url, api_key, Timeouts::default())
    }

    pub fn with_timeouts(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeouts: Timeouts,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our messages to the wire format.
    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    /// Map a transport failure to a provider error.
    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Turn a parsed chat-completions payload into a response. A payload
/// without choices, or whose first choice carries no content, is malformed.
fn parse_completion(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| ProviderError::MalformedResponse("No content in first choice".into()))?;

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderResponse {
        message: ChatMessage {
            role: Role::Assistant,
            content,
        },
        usage,
        model: api_response.model,
    })
}

#[async_trait]
impl helpline_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let text = response.text().await.map_err(Self::transport_error)?;
        let api_response: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        parse_completion(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Self::transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (private) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use helpline_core::Provider;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![
                ChatMessage::system("You are a classifier."),
                ChatMessage::user("What is my balance?"),
            ],
            temperature: 0.0,
            max_tokens: Some(30),
        }
    }

    /// Serve `app` on an ephemeral port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    async fn provider_for(status: StatusCode, body: &'static str) -> OpenAiCompatProvider {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || async move { (status, body).into_response() }),
        );
        OpenAiCompatProvider::new("test", serve(app).await, "sk-test").unwrap()
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("x", "https://api.openai.com/v1/", "k").unwrap();
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn message_conversion() {
        let api_messages = OpenAiCompatProvider::to_api_messages(&request().messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[1].content.as_deref(), Some("What is my balance?"));
    }

    #[test]
    fn request_body_carries_sampling() {
        let body = OpenAiCompatProvider::request_body(&request());
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 30);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "loans"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = parse_completion(parsed).unwrap();
        assert_eq!(response.message.content, "loans");
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.usage.unwrap().total_tokens, 11);
    }

    #[test]
    fn missing_choices_is_malformed() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            parse_completion(parsed),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_content_is_malformed() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant"}}]}"#).unwrap();
        assert!(matches!(
            parse_completion(parsed),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn complete_against_local_server() {
        let provider = provider_for(
            StatusCode::OK,
            r#"{"model":"gpt-4o-mini","choices":[{"message":{"role":"assistant","content":"Your balance is ₹47."}}]}"#,
        )
        .await;
        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.message.content, "Your balance is ₹47.");
    }

    #[tokio::test]
    async fn status_codes_are_mapped() {
        let provider = provider_for(StatusCode::UNAUTHORIZED, "{}").await;
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::AuthenticationFailed(_))
        ));

        let provider = provider_for(StatusCode::TOO_MANY_REQUESTS, "{}").await;
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::RateLimited { .. })
        ));

        let provider = provider_for(StatusCode::BAD_GATEWAY, "upstream down").await;
        match provider.complete(request()).await {
            Err(ProviderError::ApiError {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let provider = provider_for(StatusCode::OK, "not json").await;
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let provider = OpenAiCompatProvider::with_timeouts(
            "slow",
            serve(app).await,
            "sk-test",
            Timeouts {
                connect: Duration::from_secs(1),
                request: Duration::from_millis(100),
            },
        )
        .unwrap();
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let provider =
            OpenAiCompatProvider::new("gone", format!("http://{addr}/v1"), "sk-test").unwrap();
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network(_) | ProviderError::Timeout(_)
        ));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn health_check_hits_models() {
        let app = Router::new().route("/v1/models", get(|| async { r#"{"data":[]}"# }));
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "sk-test").unwrap();
        assert!(provider.health_check().await.unwrap());
    }
}
