//! The chat turn: resolve the session, personalize, invoke, persist, render.

pub mod render;

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::agent::{AgentError, AgentSession, ChatAgent};
use crate::cache::{profile_key, session_key, CacheError, CacheStore, SESSION_TTL};
use crate::profile::build_instructions;

const HEALTH_PROMPT: &str = "Say hello from Ollama";

/// The stage a chat turn was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    SessionResolving,
    Invoking,
    Persisting,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TurnStage::SessionResolving => "resolving session",
            TurnStage::Invoking => "invoking model",
            TurnStage::Persisting => "persisting session",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("cache failure while {stage}: {source}")]
    Cache {
        stage: TurnStage,
        #[source]
        source: CacheError,
    },

    #[error("model failure while {stage}: {source}")]
    Agent {
        stage: TurnStage,
        #[source]
        source: AgentError,
    },

    #[error("model call cancelled")]
    Cancelled,
}

impl TurnError {
    pub fn stage(&self) -> TurnStage {
        match self {
            TurnError::Cache { stage, .. } | TurnError::Agent { stage, .. } => *stage,
            TurnError::Cancelled => TurnStage::Invoking,
        }
    }
}

/// Result of one chat request, as HTML ready for the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was done.
    Empty,
    Reply(String),
    Failed(String),
}

impl TurnOutcome {
    pub fn into_html(self) -> String {
        match self {
            TurnOutcome::Empty => String::new(),
            TurnOutcome::Reply(html) | TurnOutcome::Failed(html) => html,
        }
    }
}

/// Runs chat turns against an injected model and cache.
///
/// Holds no per-user state: everything that survives a request lives in the
/// cache under `agentsession:{user}`. Two concurrent sends by the same user
/// both load the same session and the later write wins.
#[derive(Clone)]
pub struct ChatService {
    agent: Arc<dyn ChatAgent>,
    cache: Arc<dyn CacheStore>,
}

impl ChatService {
    pub fn new(agent: Arc<dyn ChatAgent>, cache: Arc<dyn CacheStore>) -> Self {
        Self { agent, cache }
    }

    /// Handles one message. Never fails: dependency errors are logged and
    /// turned into an apology fragment.
    #[instrument(skip(self, message, cancel))]
    pub async fn send(
        &self,
        user_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        if message.trim().is_empty() {
            return TurnOutcome::Empty;
        }

        match self.run_turn(user_id, message, cancel).await {
            Ok(text) => {
                TurnOutcome::Reply(render::bot_message(&render::markdown_to_html(&text)))
            }
            Err(err) => {
                warn!(user_id, stage = %err.stage(), error = %err, "chat turn failed");
                TurnOutcome::Failed(render::bot_error())
            }
        }
    }

    /// Forgets the user's conversation. Succeeds whether or not one existed.
    pub async fn reset(&self, user_id: &str) -> Result<(), CacheError> {
        match self.cache.remove(&session_key(user_id)).await {
            Ok(()) => {
                info!(user_id, "chat session reset");
                Ok(())
            }
            Err(err) => {
                warn!(user_id, error = %err, "chat session reset failed");
                Err(err)
            }
        }
    }

    /// One throwaway round trip to the model.
    pub async fn health(&self) -> Result<String, AgentError> {
        let mut session = self.agent.create_session().await?;
        let response = self.agent.run(HEALTH_PROMPT, &mut session, None).await?;
        Ok(response.text.unwrap_or_default())
    }

    async fn run_turn(
        &self,
        user_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TurnError> {
        let mut session = self.resolve_session(user_id).await?;
        let instructions = self.profile_instructions(user_id).await;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            result = self.agent.run(message, &mut session, instructions.as_deref()) => {
                result.map_err(|source| TurnError::Agent { stage: TurnStage::Invoking, source })?
            }
        };

        self.persist_session(user_id, &session).await?;
        Ok(response.text.unwrap_or_default())
    }

    async fn resolve_session(&self, user_id: &str) -> Result<AgentSession, TurnError> {
        let cached = self
            .cache
            .get(&session_key(user_id))
            .await
            .map_err(|source| TurnError::Cache {
                stage: TurnStage::SessionResolving,
                source,
            })?;

        if let Some(payload) = cached {
            match self.agent.deserialize_session(&payload) {
                Ok(session) => return Ok(session),
                Err(err) => warn!(user_id, error = %err, "discarding unreadable cached session"),
            }
        }

        debug!(user_id, "starting new chat session");
        self.agent
            .create_session()
            .await
            .map_err(|source| TurnError::Agent {
                stage: TurnStage::SessionResolving,
                source,
            })
    }

    // A missing or unreadable profile only costs personalization
    async fn profile_instructions(&self, user_id: &str) -> Option<String> {
        match self.cache.get(&profile_key(user_id)).await {
            Ok(document) => build_instructions(document.as_deref()),
            Err(err) => {
                warn!(user_id, error = %err, "profile cache unavailable, answering without it");
                None
            }
        }
    }

    async fn persist_session(&self, user_id: &str, session: &AgentSession) -> Result<(), TurnError> {
        let payload = self
            .agent
            .serialize_session(session)
            .map_err(|source| TurnError::Agent {
                stage: TurnStage::Persisting,
                source,
            })?;

        self.cache
            .set(&session_key(user_id), &payload, SESSION_TTL)
            .await
            .map_err(|source| TurnError::Cache {
                stage: TurnStage::Persisting,
                source,
            })
    }
}
