//! Minimal Groq chat-completions API client.
//!
//! This crate provides a focused client for Groq's OpenAI-compatible
//! `/chat/completions` endpoint with:
//! - Non-streaming completions only
//! - Bearer-token authentication
//! - Typed errors for transport, status and body failures

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Errors that can occur when using the Groq client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Response contained no completion text")]
    EmptyResponse,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Groq API client.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct Groq {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Groq {
    /// Create a new Groq client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(Duration::from_secs(120)),
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

    /// Point the client at a different OpenAI-compatible base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the API key, keeping the connection pool.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request);
        let headers = self.build_headers()?;

        tracing::debug!(
            model = %api_request.model,
            messages = api_request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        parse_response(&body)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stream: false,
            stop: request.stop.clone(),
        }
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// Parse a raw chat-completions response body.
pub fn parse_response(body: &str) -> Result<Response, Error> {
    let api_response: ApiResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    Ok(Response {
        id: api_response.id,
        model: api_response.model,
        choices: api_response
            .choices
            .into_iter()
            .map(|c| Choice {
                index: c.index,
                content: c.message.content,
                finish_reason: c.finish_reason,
            })
            .collect(),
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
///
/// Sampling parameters are fixed: temperature 1.0, top-p 1.0, up to 1024
/// completion tokens, no stop sequences, no streaming. The model comes from
/// the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    stop: Option<Vec<String>>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            stop: None,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn stop(&self) -> Option<&[String]> {
        self.stop.as_deref()
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
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A completion response from Groq.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl Response {
    /// Text of the first choice, if the provider returned one.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.content.as_deref())
    }

    /// Consume the response, yielding the first choice's text.
    pub fn into_text(self) -> Result<String, Error> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(Error::EmptyResponse)
    }
}

#[derive(Debug, Clone)]
pub struct Choice {
    pub index: usize,
    pub content: Option<String>,
    pub finish_reason: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    stream: bool,
    // Serialized as an explicit null when unset.
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: usize,
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
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_client_creation() {
        let client = Groq::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);
    }

    #[test]
    fn test_client_builders() {
        let client = Groq::new("test-key")
            .with_model("llama-3.1-8b-instant")
            .with_base_url("http://localhost:9999/v1/");
        assert_eq!(client.model(), "llama-3.1-8b-instant");
        assert_eq!(client.base_url(), "http://localhost:9999/v1");
    }

    #[test]
    fn test_request_parameters_are_fixed() {
        let request = Request::new(vec![Message::user("Hello")]);
        assert_eq!(request.temperature(), 1.0);
        assert_eq!(request.max_tokens(), 1024);
        assert_eq!(request.top_p(), 1.0);
        assert!(request.stop().is_none());

        // Only the client picks the model
        let client = Groq::new("test-key").with_model("llama-3.1-8b-instant");
        let json = serde_json::to_value(client.build_api_request(&request)).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["temperature"], 1.0);
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn test_wire_format() {
        let client = Groq::new("test-key");
        let request = Request::new(vec![
            Message::system("You are the game master"),
            Message::user("look around"),
            Message::assistant("You see a corridor."),
        ]);
        let json = serde_json::to_value(client.build_api_request(&request)).unwrap();

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["temperature"], 1.0);
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["stream"], false);
        assert!(json["stop"].is_null());
        assert!(json.as_object().unwrap().contains_key("stop"));
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"][1]["content"], "look around");
    }

    #[test]
    fn test_headers_require_key() {
        let client = Groq::new("   ");
        assert!(matches!(client.build_headers(), Err(Error::NoApiKey)));

        let headers = Groq::new("secret").build_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "llama3-8b-8192",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "The cell door creaks."}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text(), Some("The cell door creaks."));
        assert_eq!(response.usage.as_ref().map(|u| u.completion_tokens), Some(5));
        assert_eq!(response.into_text().unwrap(), "The cell door creaks.");
    }

    #[test]
    fn test_parse_malformed_and_empty() {
        assert!(matches!(parse_response("not json"), Err(Error::Parse(_))));
        assert!(matches!(parse_response(r#"{"id": "x"}"#), Err(Error::Parse(_))));

        let empty = parse_response(r#"{"choices": []}"#).unwrap();
        assert!(empty.text().is_none());
        assert!(matches!(empty.into_text(), Err(Error::EmptyResponse)));

        let null_content =
            parse_response(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(null_content.into_text(), Err(Error::EmptyResponse)));
    }

    /// Serve exactly one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let mut read = 0;
            // Read until the end of the headers and the declared body.
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
                let text = String::from_utf8_lossy(&buf[..read]).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if read >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn test_complete_success() {
        let base = serve_once(
            "200 OK",
            r#"{"id":"a","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"Dust swirls."}}]}"#,
        )
        .await;
        let client = Groq::new("k").with_base_url(base);
        let response = client
            .complete(Request::new(vec![Message::user("look")]))
            .await
            .unwrap();
        assert_eq!(response.text(), Some("Dust swirls."));
    }

    #[tokio::test]
    async fn test_complete_non_success_status() {
        let base = serve_once("503 Service Unavailable", r#"{"error":"overloaded"}"#).await;
        let client = Groq::new("k").with_base_url(base);
        let err = client
            .complete(Request::new(vec![Message::user("look")]))
            .await
            .unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_network_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client = Groq::new("k").with_base_url("http://127.0.0.1:9/v1");
        let err = client
            .complete(Request::new(vec![Message::user("look")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
