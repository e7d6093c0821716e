//! The completion provider boundary and its fail-soft client.

use crate::session::Credential;
use async_trait::async_trait;
use std::time::Duration;

/// Narrator line used whenever the provider exchange fails.
pub const FALLBACK_NARRATIVE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Something that can turn a request into narrator text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        request: groq::Request,
        credential: &Credential,
    ) -> Result<String, groq::Error>;
}

/// Provider backed by the Groq HTTP API.
#[derive(Clone)]
pub struct GroqProvider {
    client: groq::Groq,
}

impl GroqProvider {
    /// A provider with the default model and endpoint. The key is supplied
    /// per call from the session credential.
    pub fn new() -> Self {
        Self {
            client: groq::Groq::new(""),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.client = self.client.with_model(model);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

impl Default for GroqProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(
        &self,
        request: groq::Request,
        credential: &Credential,
    ) -> Result<String, groq::Error> {
        let client = self.client.clone().with_api_key(credential.expose());
        client.complete(request).await?.into_text()
    }
}

/// Result of one completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// True when `text` is the fallback line.
    pub degraded: bool,
}

/// Wraps a provider so that every failure becomes [`FALLBACK_NARRATIVE`].
///
/// Exactly one attempt is made per call.
#[derive(Clone)]
pub struct CompletionClient<P> {
    provider: P,
}

impl<P: CompletionProvider> CompletionClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn complete(&self, request: groq::Request, credential: &Credential) -> Completion {
        match self.provider.complete(request, credential).await {
            Ok(text) => Completion {
                text,
                degraded: false,
            },
            Err(err) => {
                tracing::warn!(error = %err, "completion failed, using fallback narrative");
                Completion {
                    text: FALLBACK_NARRATIVE.to_string(),
                    degraded: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    fn credential() -> Credential {
        Credential::new("k").unwrap()
    }

    fn request() -> groq::Request {
        groq::Request::new(vec![groq::Message::user("hello")])
    }

    #[tokio::test]
    async fn test_success_passes_text_through() {
        let client = CompletionClient::new(MockProvider::new().reply("The hatch opens."));
        let completion = client.complete(request(), &credential()).await;
        assert_eq!(completion.text, "The hatch opens.");
        assert!(!completion.degraded);
    }

    #[tokio::test]
    async fn test_failures_become_fallback() {
        let provider = MockProvider::new()
            .fail(groq::Error::Api {
                status: 500,
                message: "boom".into(),
            })
            .fail(groq::Error::Network("refused".into()))
            .fail(groq::Error::EmptyResponse);
        let client = CompletionClient::new(provider);

        for _ in 0..3 {
            let completion = client.complete(request(), &credential()).await;
            assert_eq!(completion.text, FALLBACK_NARRATIVE);
            assert!(completion.degraded);
        }
        assert_eq!(client.provider().calls(), 3);
    }

    #[tokio::test]
    async fn test_groq_provider_without_server_degrades() {
        let provider = GroqProvider::new()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = CompletionClient::new(provider);
        let completion = client.complete(request(), &credential()).await;
        assert!(completion.degraded);
    }
}
