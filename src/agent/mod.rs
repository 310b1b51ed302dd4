//! Model-serving contract.
//!
//! The rest of the crate talks to the language model only through
//! [`ChatAgent`]. Conversation state is an [`AgentSession`]: bytes owned by
//! the agent implementation that the application stores and hands back
//! without looking inside.

mod ollama;

use async_trait::async_trait;

pub use ollama::{ChatMessage, OllamaAgent, OllamaConfig};

/// Opaque multi-turn dialogue state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    payload: Vec<u8>,
}

impl AgentSession {
    /// Wraps an agent-specific payload. Only agent implementations should
    /// need this.
    pub fn from_payload(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// What the model said back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentResponse {
    pub text: Option<String>,
}

/// Errors raised by the model-serving component.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid session payload: {0}")]
    Session(String),

    #[error("unexpected model response: {0}")]
    Response(String),
}

/// A conversational model with externally persisted sessions.
///
/// Implementations must make [`serialize_session`](Self::serialize_session)
/// the exact inverse of [`deserialize_session`](Self::deserialize_session):
/// loading a payload and serializing it again without a `run` in between
/// yields the same bytes.
#[async_trait]
pub trait ChatAgent: Send + Sync + 'static {
    /// Starts an empty conversation.
    async fn create_session(&self) -> Result<AgentSession, AgentError>;

    /// Sends `message` within `session`. `instructions` steer this one reply
    /// and are not remembered by the session. On error the session is left
    /// untouched.
    async fn run(
        &self,
        message: &str,
        session: &mut AgentSession,
        instructions: Option<&str>,
    ) -> Result<AgentResponse, AgentError>;

    fn serialize_session(&self, session: &AgentSession) -> Result<Vec<u8>, AgentError>;

    /// Validates a stored payload and turns it back into a session.
    fn deserialize_session(&self, payload: &[u8]) -> Result<AgentSession, AgentError>;
}
