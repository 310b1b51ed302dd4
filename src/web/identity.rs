//! Caller identity.
//!
//! Authentication itself belongs to an external identity provider. Its
//! integration either stores the subject in the cookie session through
//! [`sign_in`], or a trusted proxy forwards it in a configured header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;
use tracing::warn;

use super::AppState;
use crate::error::AppError;

/// Cookie-session key holding the authenticated user id.
pub const USER_ID_KEY: &str = "user_id";

/// The authenticated caller. Extracting it rejects anonymous requests with
/// `401` before any handler side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(header) = &state.identity_header {
            let forwarded = parts
                .headers
                .get(header)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty());

            if let Some(user_id) = forwarded {
                return Ok(AuthUser(user_id.to_owned()));
            }
        }

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Err(AppError::Unauthorized);
        };

        match session.get::<String>(USER_ID_KEY).await {
            Ok(Some(user_id)) if !user_id.trim().is_empty() => Ok(AuthUser(user_id)),
            Ok(_) => Err(AppError::Unauthorized),
            Err(err) => {
                warn!(error = %err, "failed to read cookie session");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Binds `user_id` to the cookie session, rotating the session id.
pub async fn sign_in(session: &Session, user_id: &str) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await
}
