use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::AuthUser;
use super::AppState;
use crate::error::AppError;
use crate::profile::{ProfileError, ProfileInput, ProfileView, UpsertOutcome};

/// Response to `POST /profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSaved {
    pub success: bool,
    pub message: String,
    pub outcome: UpsertOutcome,
    pub profile: ProfileView,
}

/// A JSON profile body. Bodies that are not valid JSON or do not match the
/// form's field types are rejected like any other validation failure.
pub struct ProfileBody(pub ProfileInput);

impl<S: Send + Sync> FromRequest<S> for ProfileBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<ProfileInput>::from_request(req, state).await {
            Ok(Json(input)) => Ok(Self(input)),
            Err(rejection) => Err(ProfileError::Validation(rejection.body_text()).into()),
        }
    }
}

/// GET /profile
pub async fn current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.profiles.current(&user_id).await?))
}

/// POST /profile
pub async fn upsert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ProfileBody(input): ProfileBody,
) -> Result<Json<ProfileSaved>, AppError> {
    let (profile, outcome) = state.profiles.upsert(&user_id, input).await?;
    let message = match outcome {
        UpsertOutcome::Created => "Your profile has been created.",
        UpsertOutcome::Updated => "Your profile has been updated.",
    };

    Ok(Json(ProfileSaved {
        success: true,
        message: message.to_string(),
        outcome,
        profile,
    }))
}

/// GET /profiles
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ProfileView>>, AppError> {
    Ok(Json(state.profiles.list(&user_id).await?))
}

/// POST /profiles
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ProfileBody(input): ProfileBody,
) -> Result<(StatusCode, Json<ProfileView>), AppError> {
    let profile = state.profiles.create(&user_id, input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /profiles/{id}
pub async fn view(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.profiles.view(&user_id, id).await?))
}

/// PUT /profiles/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ProfileBody(input): ProfileBody,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.profiles.update(&user_id, id, input).await?))
}

/// DELETE /profiles/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.profiles.delete(&user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
