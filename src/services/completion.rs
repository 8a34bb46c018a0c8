//! Chat-completion call to the LLM provider.
//!
//! [`CompletionClient`] owns provider selection, credential checks, failure
//! classification and response parsing. The actual bytes-on-the-wire part is
//! behind [`ChatTransport`] so it can be swapped out in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::config::Config;

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// Status and body as received from the provider.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post(&self, api_key: &str, request: &ChatRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport with a bounded per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", api_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post(&self, api_key: &str, request: &ChatRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        Ok(RawResponse { status, body })
    }
}

/// Builder, decode and redirect errors are the only ones retrying cannot fix.
/// A peer that closes or resets mid-request (`is_request`) or mid-body
/// (`is_body`) counts as a connection failure.
fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_builder() || e.is_decode() || e.is_redirect() {
        TransportError::Other(e.to_string())
    } else if e.is_connect() || e.is_request() || e.is_body() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// Worth retrying: timeouts, connection failures, 429 and 5xx.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Retrying will not help: bad request, bad credentials, malformed output.
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl CompletionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CompletionError::Transient(_))
    }
}

impl From<TransportError> for CompletionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) | TransportError::Connect(_) => {
                CompletionError::Transient(err.to_string())
            }
            TransportError::Other(_) => CompletionError::Permanent(err.to_string()),
        }
    }
}

pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    provider: String,
    api_key: String,
    log_payloads: bool,
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        provider: impl Into<String>,
        api_key: impl Into<String>,
        log_payloads: bool,
    ) -> Self {
        Self {
            transport,
            provider: provider.into(),
            api_key: api_key.into(),
            log_payloads,
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn ChatTransport>) -> Self {
        Self::new(
            transport,
            config.llm_provider.clone(),
            config.openai_api_key.clone(),
            config.is_development(),
        )
    }

    /// Send the request and return the parsed JSON object the model produced.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Value, CompletionError> {
        match self.provider.as_str() {
            "openai" => self.complete_openai(request).await,
            other => Err(CompletionError::Permanent(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }

    async fn complete_openai(&self, request: &ChatRequest) -> Result<Value, CompletionError> {
        if self.api_key.trim().is_empty() {
            return Err(CompletionError::Permanent(
                "OpenAI API key not configured".into(),
            ));
        }

        let started = Instant::now();
        let result = self.transport.post(&self.api_key, request).await;
        self.log_exchange(request, result.as_ref().ok(), started.elapsed());

        parse_completion(result?)
    }

    fn log_exchange(&self, request: &ChatRequest, response: Option<&RawResponse>, elapsed: Duration) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let status = response.map(|r| r.status);

        if self.log_payloads {
            let request_body = serde_json::to_string(request).unwrap_or_default();
            let response_body = response.map(|r| r.body.as_str()).unwrap_or("");
            tracing::debug!(
                llm = %self.provider,
                status = ?status,
                elapsed_ms = elapsed_ms,
                request = %request_body,
                response = %response_body,
                "LLM exchange"
            );
        } else {
            tracing::debug!(
                llm = %self.provider,
                model = %request.model,
                temperature = request.temperature,
                status = ?status,
                elapsed_ms = elapsed_ms,
                messages = "[redacted]",
                response = "[redacted]",
                "LLM exchange"
            );
        }
    }
}

/// Classify the HTTP outcome and pull the JSON payload out of
/// `choices[0].message.content`.
pub fn parse_completion(response: RawResponse) -> Result<Value, CompletionError> {
    if response.status >= 500 || response.status == 429 {
        return Err(CompletionError::Transient(format!(
            "temporary failure status={}",
            response.status
        )));
    }

    if response.status != 200 {
        return Err(CompletionError::Permanent(format!(
            "request failed status={} body={}",
            response.status,
            truncate(&response.body, 200)
        )));
    }

    let envelope: Value = serde_json::from_str(&response.body)
        .map_err(|e| CompletionError::Permanent(format!("Invalid JSON payload: {}", e)))?;

    let content = envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default();

    serde_json::from_str(content)
        .map_err(|e| CompletionError::Permanent(format!("Invalid completion JSON: {}", e)))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{completion_body, ScriptedTransport};
    use serde_json::json;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4.1-mini".into(),
            temperature: 0.2,
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
        }
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_server_errors_and_throttling_are_transient() {
        for status in [429, 500, 502, 503] {
            let err = parse_completion(raw(status, "")).unwrap_err();
            assert!(err.is_transient(), "status {status} should be transient");
        }
    }

    #[test]
    fn test_client_errors_are_permanent() {
        for status in [400, 401, 404, 201] {
            let err = parse_completion(raw(status, "{}")).unwrap_err();
            assert!(!err.is_transient(), "status {status} should be permanent");
        }
    }

    #[test]
    fn test_extracts_first_choice_content() {
        let body = completion_body(&json!({"d": 30, "cal": 250, "n": 0, "sd": "Run"}));
        let value = parse_completion(raw(200, &body)).unwrap();
        assert_eq!(value["cal"], 250);
    }

    #[test]
    fn test_malformed_completion_is_permanent() {
        let body = json!({"choices": [{"message": {"content": "Sure! Here is the JSON"}}]}).to_string();
        let err = parse_completion(raw(200, &body)).unwrap_err();
        assert!(matches!(err, CompletionError::Permanent(_)));

        let err = parse_completion(raw(200, "<html>")).unwrap_err();
        assert!(matches!(err, CompletionError::Permanent(_)));
    }

    #[test]
    fn test_missing_content_is_permanent() {
        let err = parse_completion(raw(200, r#"{"choices": []}"#)).unwrap_err();
        assert!(matches!(err, CompletionError::Permanent(_)));
    }

    #[test]
    fn test_network_errors_classification() {
        let err: CompletionError = TransportError::Timeout("read".into()).into();
        assert!(err.is_transient());
        let err: CompletionError = TransportError::Connect("refused".into()).into();
        assert!(err.is_transient());
        let err: CompletionError = TransportError::Other("builder".into()).into();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_connection_dropped_by_peer_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let transport =
            HttpTransport::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = transport.post("sk-test", &request()).await.unwrap_err();

        assert!(
            matches!(err, TransportError::Connect(_) | TransportError::Timeout(_)),
            "unexpected {err:?}"
        );
        assert!(CompletionError::from(err).is_transient());
    }

    #[tokio::test]
    async fn test_client_posts_through_transport() {
        let transport = ScriptedTransport::new(vec![Ok(raw(
            200,
            &completion_body(&json!({"s": 4, "fp": "ok", "fi": "more water"})),
        ))]);
        let client = CompletionClient::new(transport.clone(), "openai", "sk-test", false);

        let value = client.complete(&request()).await.unwrap();
        assert_eq!(value["s"], 4);
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.last_request().unwrap(), request());
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_permanent() {
        let transport = ScriptedTransport::new(vec![]);
        let client = CompletionClient::new(transport.clone(), "acme", "sk-test", false);

        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(
            err,
            CompletionError::Permanent("Unsupported LLM provider: acme".into())
        );
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_permanent() {
        let transport = ScriptedTransport::new(vec![]);
        let client = CompletionClient::new(transport.clone(), "openai", "  ", false);

        let err = client.complete(&request()).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(transport.calls(), 0);
    }
}
