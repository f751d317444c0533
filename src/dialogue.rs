//! Remote Dialogue Client: one request, one reply, no state.
//!
//! Talks to any server implementing the OpenAI chat completions API
//! (Groq, Perplexity, Ollama, vLLM, ...). Failures are not exceptional
//! here: [`DialogueClient::reply`] turns them into a `"<Backend> error: ..."`
//! sentence that is spoken and displayed like any other reply.

use crate::config::DialogueConfig;
use crate::error::{AssistantError, Result};
use crate::memory::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A chat-completion backend.
#[async_trait]
pub trait DialogueBackend: Send + Sync {
    /// Send the full message sequence and return the assistant reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Outcome of a remote call as seen by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueReply {
    /// The backend answered; the exchange should be recorded.
    Reply(String),
    /// The backend failed; the text is the user-facing error sentence.
    Failed(String),
}

/// Wraps a backend and converts its errors to reply text.
#[derive(Clone)]
pub struct DialogueClient {
    backend: Arc<dyn DialogueBackend>,
    backend_name: String,
    system_prompt: String,
}

impl std::fmt::Debug for DialogueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueClient")
            .field("backend_name", &self.backend_name)
            .finish()
    }
}

impl DialogueClient {
    pub fn new(
        backend: Arc<dyn DialogueBackend>,
        backend_name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            backend_name: backend_name.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// The system preamble placed first in every request.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Ask the backend. Never fails.
    pub async fn reply(&self, messages: &[ChatMessage]) -> DialogueReply {
        match self.backend.complete(messages).await {
            Ok(text) => DialogueReply::Reply(text.trim().to_owned()),
            Err(e) => {
                warn!("{} request failed: {e}", self.backend_name);
                DialogueReply::Failed(format!("{} error: {}", self.backend_name, detail(&e)))
            }
        }
    }
}

/// Error detail without the crate-level prefix.
fn detail(e: &AssistantError) -> String {
    match e {
        AssistantError::Backend(msg) | AssistantError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// OpenAI-compatible chat completions over HTTP (non-streaming).
pub struct OpenAiChatBackend {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatBackend")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChatBackend {
    /// Create a backend from config and an (optional) API key.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &DialogueConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: completions_url(&config.api_url),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

/// `<base>/v1/chat/completions`, whether or not `base` already ends in `/v1`.
fn completions_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/chat/completions")
}

/// Extract an error message from an OpenAI-style error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl DialogueBackend for OpenAiChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        debug!("dialogue request with {} messages", messages.len());

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AssistantError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&body_text)
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Backend(format!("invalid response body: {e}")))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_owned())
            .ok_or_else(|| AssistantError::Backend("response has no message content".into()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    struct Failing;

    #[async_trait]
    impl DialogueBackend for Failing {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(AssistantError::Backend("HTTP 401: invalid api key".into()))
        }
    }

    struct Echo;

    #[async_trait]
    impl DialogueBackend for Echo {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(format!("  {}  ", messages.len()))
        }
    }

    #[test]
    fn completions_url_normalizes_suffix() {
        assert_eq!(
            completions_url("https://api.groq.com/openai/v1"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:11434/"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn error_message_is_extracted_from_json_body() {
        assert_eq!(
            extract_error_message(r#"{"error": {"message": "bad model"}}"#),
            "bad model"
        );
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[tokio::test]
    async fn failure_becomes_prefixed_reply_text() {
        let client = DialogueClient::new(Arc::new(Failing), "Groq", "sys");
        let reply = client.reply(&[ChatMessage::user("hi")]).await;
        assert_eq!(
            reply,
            DialogueReply::Failed("Groq error: HTTP 401: invalid api key".to_owned())
        );
    }

    #[tokio::test]
    async fn success_is_trimmed() {
        let client = DialogueClient::new(Arc::new(Echo), "Groq", "sys");
        let reply = client
            .reply(&[ChatMessage::system("s"), ChatMessage::user("hi")])
            .await;
        assert_eq!(reply, DialogueReply::Reply("2".to_owned()));
    }
}
