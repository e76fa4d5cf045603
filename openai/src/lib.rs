//! Minimal OpenAI chat-completions client.
//!
//! This crate provides a focused, blocking client for the Chat Completions API:
//! - Request/response wire types
//! - A pluggable [`Transport`] so the HTTP layer can be replaced in tests
//!   or on constrained targets
//! - Errors that keep transport, service and protocol failures apart

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Errors that can occur when using the OpenAI client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the body was not a usable completion.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ============================================================================
// Transport
// ============================================================================

/// A single outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// The status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response primitive the client is built on.
///
/// Implementations report anything that prevents a response from arriving
/// as [`Error::Network`]; any status code, success or not, is returned as an
/// [`HttpResponse`].
pub trait Transport {
    fn request(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// [`Transport`] backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Client
// ============================================================================

/// OpenAI chat-completions client.
pub struct OpenAi<T = ReqwestTransport> {
    transport: T,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAi<ReqwestTransport> {
    /// Create a new client with the given API key, using reqwest for HTTP.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Ok(Self::with_transport(api_key, ReqwestTransport::new()?))
    }

    /// Create a client from the OPENAI_API_KEY environment variable.
    ///
    /// An unset or blank variable is [`Error::NoApiKey`].
    pub fn from_env() -> Result<Self, Error> {
        Self::new(require_key(std::env::var(API_KEY_VAR).ok())?)
    }
}

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

fn require_key(value: Option<String>) -> Result<String, Error> {
    value
        .filter(|key| !key.trim().is_empty())
        .ok_or(Error::NoApiKey)
}

impl<T: Transport> OpenAi<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn with_transport(api_key: impl Into<String>, transport: T) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a compatible endpoint other than api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request and return the first choice.
    pub fn complete(&self, request: &Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(request);
        let body = serde_json::to_vec(&api_request)
            .map_err(|e| Error::Config(format!("Failed to encode request: {e}")))?;
        let headers = self.build_headers()?;

        debug!(
            model = %api_request.model,
            messages = api_request.messages.len(),
            "sending chat completion request"
        );

        let response = self.transport.request(HttpRequest {
            method: Method::POST,
            url: format!("{}/chat/completions", self.base_url),
            headers,
            body,
        })?;

        if !response.is_success() {
            return Err(Error::Api {
                status: response.status,
                message: response.body,
            });
        }

        let api_response: ApiResponse =
            serde_json::from_str(&response.body).map_err(|e| Error::Parse(e.to_string()))?;

        parse_response(api_response)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request<'a>(&'a self, request: &'a Request) -> ApiRequest<'a> {
        ApiRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

fn parse_response(api_response: ApiResponse) -> Result<Response, Error> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("response contained no choices".to_string()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| Error::Parse("first choice has no message content".to_string()))?;

    Ok(Response {
        id: api_response.id,
        model: api_response.model,
        content,
        finish_reason: choice.finish_reason,
        usage: api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

// ============================================================================
// Public types
// ============================================================================

/// A chat-completion request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// The role string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// The first choice of a completion response.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: Option<String>,
    pub model: Option<String>,
    /// Message content exactly as returned, untrimmed.
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every request and answers with a canned result.
    struct FakeTransport {
        reply: RefCell<Option<Result<HttpResponse, Error>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                reply: RefCell::new(Some(Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }))),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(error: Error) -> Self {
            Self {
                reply: RefCell::new(Some(Err(error))),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for FakeTransport {
        fn request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
            self.seen.borrow_mut().push(request);
            self.reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(Error::Network("no reply queued".into())))
        }
    }

    fn ok_body(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-3.5-turbo",
            "choices": [
                {"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        })
        .to_string()
    }

    fn request() -> Request {
        Request::new(vec![
            Message::system("You are the GM."),
            Message::user("PLAYER: New game"),
        ])
    }

    #[test]
    fn test_client_defaults() {
        let client = OpenAi::with_transport("key", FakeTransport::answering(200, "{}"));
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);

        let client = client
            .with_model("gpt-4o-mini")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_wire_format() {
        let client = OpenAi::with_transport("sk-test", FakeTransport::answering(200, &ok_body("Hi")));
        client.complete(&request()).unwrap();

        let seen = client.transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        let sent = &seen[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(sent.headers[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(sent.headers[CONTENT_TYPE], "application/json");

        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "You are the GM."},
                    {"role": "user", "content": "PLAYER: New game"}
                ]
            })
        );
    }

    #[test]
    fn test_request_overrides() {
        let client = OpenAi::with_transport("k", FakeTransport::answering(200, &ok_body("x")));
        let request = request()
            .with_model("gpt-4o")
            .with_temperature(0.5)
            .with_max_tokens(300);
        client.complete(&request).unwrap();

        let seen = client.transport.seen.borrow();
        let body: serde_json::Value = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 300);
    }

    #[test]
    fn test_response_parsing() {
        let client = OpenAi::with_transport(
            "k",
            FakeTransport::answering(200, &ok_body("  You stand outside.\n")),
        );
        let response = client.complete(&request()).unwrap();

        assert_eq!(response.content, "  You stand outside.\n");
        assert_eq!(response.id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            response.usage,
            Some(Usage {
                prompt_tokens: 12,
                completion_tokens: 5
            })
        );
    }

    #[test]
    fn test_non_success_status_is_api_error() {
        let client = OpenAi::with_transport("k", FakeTransport::answering(429, "slow down"));
        let err = client.complete(&request()).unwrap_err();

        match &err {
            Error::Api { status, message } => {
                assert_eq!(*status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_network_error_passes_through() {
        let client = OpenAi::with_transport(
            "k",
            FakeTransport::failing(Error::Network("connection refused".into())),
        );
        let err = client.complete(&request()).unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_malformed_bodies_are_parse_errors() {
        for body in [
            "not json",
            r#"{"choices": []}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#,
            r#"{"choices": [{"message": {"role": "assistant"}}]}"#,
            r#"{"error": "nope"}"#,
        ] {
            let client = OpenAi::with_transport("k", FakeTransport::answering(200, body));
            let err = client.complete(&request()).unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "body {body:?} gave {err:?}");
        }
    }

    #[test]
    fn test_blank_or_missing_key_is_rejected() {
        assert!(matches!(require_key(None), Err(Error::NoApiKey)));
        assert!(matches!(require_key(Some("  \n".into())), Err(Error::NoApiKey)));
        assert_eq!(require_key(Some("sk-test".into())).unwrap(), "sk-test");
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let client = OpenAi::with_transport("bad\nkey", FakeTransport::answering(200, "{}"));
        let err = client.complete(&request()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(client.transport.seen.borrow().is_empty());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }
}
