use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::identity::AuthUser;
use super::AppState;
use crate::chat::render;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /chat/send
pub async fn send(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Form(form): Form<SendForm>,
) -> Html<String> {
    let cancel = state.shutdown.child_token();
    let outcome = state.chat.send(&user_id, &form.message, &cancel).await;
    Html(outcome.into_html())
}

/// POST /chat/reset
pub async fn reset(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Html<String> {
    match state.chat.reset(&user_id).await {
        Ok(()) => Html(render::reset_confirmation()),
        Err(_) => Html(render::reset_failed()),
    }
}

/// GET /chat/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    match state.chat.health().await {
        Ok(message) => (
            StatusCode::OK,
            Json(HealthReport {
                success: true,
                message: Some(message),
                error: None,
            }),
        ),
        Err(err) => {
            warn!(error = %err, "model health check failed");
            (
                StatusCode::BAD_REQUEST,
                Json(HealthReport {
                    success: false,
                    message: None,
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}
