use crate::models::{ChatMessage, ChatRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "Du bist ein hilfreicher KI-Assistent für einen IT-Helpdesk. Antworte professionell und freundlich auf Deutsch.";
const EMPTY_COMPLETION: &str = "Entschuldigung, ich konnte keine passende Antwort generieren. Können Sie Ihre Frage bitte umformulieren?";

/// Errors from the chat completion API
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Upstream returned error: status={status} message={message}")]
    Upstream { status: u16, message: String },

    #[error("Chat completion is not configured")]
    NotConfigured,

    #[error("Conversation is empty")]
    EmptyConversation,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completion client
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: ChatMessage,
    client: Client,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            model,
            system_prompt: ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Complete a conversation
    ///
    /// The helpdesk system prompt is prepended to `messages`.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.api_key.as_ref().ok_or(ChatError::NotConfigured)?;
        if messages.is_empty() {
            return Err(ChatError::EmptyConversation);
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: std::iter::once(&self.system_prompt).chain(messages).collect(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            tracing::error!("Chat completion failed: {} - {}", status, message);
            return Err(ChatError::Upstream { status, message });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());

        Ok(content)
    }
}
