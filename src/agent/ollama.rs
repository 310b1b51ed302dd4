// Ollama chat client (native /api/chat endpoint, local LLM)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{AgentError, AgentResponse, AgentSession, ChatAgent};

/// Connection and behavior settings for [`OllamaAgent`].
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Upper bound for a whole request, including generation.
    pub timeout: Duration,
    /// Sent as the first system message of every request.
    pub system_prompt: Option<String>,
    /// Maximum number of stored history messages; 0 keeps everything.
    pub history_limit: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ollama:11434".to_string(),
            model: "gemma3:270m".to_string(),
            timeout: Duration::from_secs(120),
            system_prompt: None,
            history_limit: 40,
        }
    }
}

/// One chat message in Ollama's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Session payload: the stored dialogue, user and assistant turns only.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Conversation {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// Strip trailing slashes and an OpenAI-compatible `/v1` suffix
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim_end_matches('/').to_string();
    if url.ends_with("/v1") {
        url.truncate(url.len() - 3);
    }
    url
}

/// [`ChatAgent`] backed by an Ollama server.
pub struct OllamaAgent {
    base_url: String,
    config: OllamaConfig,
    http: reqwest::Client,
}

impl OllamaAgent {
    pub fn new(config: OllamaConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            config,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Request messages: base prompt, per-request instructions, history, then
    /// the new user message.
    fn build_messages(
        &self,
        history: &[ChatMessage],
        instructions: Option<&str>,
        message: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        if let Some(instructions) = instructions {
            messages.push(ChatMessage::system(instructions));
        }
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(message));
        messages
    }

    fn trim_history(&self, messages: &mut Vec<ChatMessage>) {
        let limit = self.config.history_limit;
        if limit == 0 || messages.len() <= limit {
            return;
        }
        // Drop whole user/assistant pairs
        let mut excess = messages.len() - limit;
        excess += excess % 2;
        messages.drain(..excess.min(messages.len()));
    }
}

fn decode(payload: &[u8]) -> Result<Conversation, AgentError> {
    serde_json::from_slice(payload).map_err(|e| AgentError::Session(e.to_string()))
}

fn encode(conversation: &Conversation) -> Result<Vec<u8>, AgentError> {
    serde_json::to_vec(conversation).map_err(|e| AgentError::Session(e.to_string()))
}

#[async_trait]
impl ChatAgent for OllamaAgent {
    async fn create_session(&self) -> Result<AgentSession, AgentError> {
        Ok(AgentSession::from_payload(encode(&Conversation::default())?))
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn run(
        &self,
        message: &str,
        session: &mut AgentSession,
        instructions: Option<&str>,
    ) -> Result<AgentResponse, AgentError> {
        let mut conversation = decode(session.payload())?;
        let messages = self.build_messages(&conversation.messages, instructions, message);
        debug!(message_count = messages.len(), "sending chat request");

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&ChatRequest {
                model: &self.config.model,
                messages: &messages,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status { status, body });
        }

        let reply = response
            .json::<ChatResponse>()
            .await?
            .message
            .ok_or_else(|| AgentError::Response("reply has no message".to_string()))?;

        conversation.messages.push(ChatMessage::user(message));
        conversation
            .messages
            .push(ChatMessage::assistant(reply.content.clone()));
        self.trim_history(&mut conversation.messages);

        *session = AgentSession::from_payload(encode(&conversation)?);

        Ok(AgentResponse {
            text: Some(reply.content),
        })
    }

    fn serialize_session(&self, session: &AgentSession) -> Result<Vec<u8>, AgentError> {
        Ok(session.payload().to_vec())
    }

    fn deserialize_session(&self, payload: &[u8]) -> Result<AgentSession, AgentError> {
        decode(payload)?;
        Ok(AgentSession::from_payload(payload.to_vec()))
    }
}
