use std::sync::Arc;

use sea_orm::prelude::{DateTimeWithTimeZone, Json, Uuid};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::compact::{json_to_list, CompactProfile};
use super::input::{describe, ProfileInput};
use super::repository::ProfileRepository;
use crate::cache::{profile_key, CacheError, CacheStore, PROFILE_TTL};
use crate::entity::user_profile::Model as ProfileModel;

/// Errors raised by profile operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("{0}")]
    Validation(String),

    #[error("profile not found")]
    NotFound,

    #[error("this profile belongs to another user")]
    Forbidden,

    #[error("a profile already exists for this user")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Whether an upsert created a new row or updated the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// A profile as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    /// `None` for the unsaved placeholder.
    pub id: Option<Uuid>,
    pub user_id: String,
    pub nickname: String,
    pub preferred_language: String,
    pub tone_preference: Option<String>,
    pub learning_goals: Option<String>,
    pub favorite_authors: Option<String>,
    pub about_me: Option<String>,
    pub reading_languages: Vec<String>,
    pub learning_style: Vec<String>,
    pub loved_genres: Vec<String>,
    pub disliked_genres: Vec<String>,
    pub agent_profile_compact: Json,
    pub agent_profile_version: i32,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl ProfileView {
    /// What an identity without a stored profile sees.
    pub fn placeholder(user_id: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_owned(),
            nickname: String::new(),
            preferred_language: "en".to_string(),
            tone_preference: None,
            learning_goals: None,
            favorite_authors: None,
            about_me: None,
            reading_languages: Vec::new(),
            learning_style: Vec::new(),
            loved_genres: Vec::new(),
            disliked_genres: Vec::new(),
            agent_profile_compact: Json::Object(Default::default()),
            agent_profile_version: 1,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<ProfileModel> for ProfileView {
    fn from(model: ProfileModel) -> Self {
        Self {
            id: Some(model.id),
            reading_languages: json_to_list(model.reading_languages.as_ref()).unwrap_or_default(),
            learning_style: json_to_list(model.learning_style.as_ref()).unwrap_or_default(),
            loved_genres: json_to_list(model.loved_genres.as_ref()).unwrap_or_default(),
            disliked_genres: json_to_list(model.disliked_genres.as_ref()).unwrap_or_default(),
            user_id: model.user_id,
            nickname: model.nickname,
            preferred_language: model.preferred_language,
            tone_preference: model.tone_preference,
            learning_goals: model.learning_goals,
            favorite_authors: model.favorite_authors,
            about_me: model.about_me,
            agent_profile_compact: model.agent_profile_compact,
            agent_profile_version: model.agent_profile_version,
            created_at: Some(model.created_at),
            updated_at: Some(model.updated_at),
        }
    }
}

/// Profile use cases, all scoped to the calling identity.
///
/// The database is the source of truth. Every successful write refreshes the
/// compact snapshot under `agentprofile:{user}` so the chat path can read it
/// without touching the database.
#[derive(Debug, Clone)]
pub struct ProfileService {
    repo: ProfileRepository,
    cache: Arc<dyn CacheStore>,
}

impl ProfileService {
    pub fn new(conn: DatabaseConnection, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            repo: ProfileRepository::new(conn),
            cache,
        }
    }

    /// The caller's stored profile, or an unsaved placeholder.
    pub async fn current(&self, user_id: &str) -> Result<ProfileView, ProfileError> {
        Ok(self
            .repo
            .find_by_user(user_id)
            .await?
            .map(ProfileView::from)
            .unwrap_or_else(|| ProfileView::placeholder(user_id)))
    }

    pub async fn upsert(
        &self,
        user_id: &str,
        input: ProfileInput,
    ) -> Result<(ProfileView, UpsertOutcome), ProfileError> {
        let fields = input
            .into_fields()
            .map_err(|e| ProfileError::Validation(describe(&e)))?;

        let (model, created) = self.repo.upsert(user_id, fields).await.map_err(conflict)?;
        self.refresh_cache(&model).await?;

        let outcome = if created {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };
        info!(user_id, version = model.agent_profile_version, ?outcome, "profile saved");
        Ok((model.into(), outcome))
    }

    /// Creates the caller's profile; fails if one already exists.
    pub async fn create(
        &self,
        user_id: &str,
        input: ProfileInput,
    ) -> Result<ProfileView, ProfileError> {
        let fields = input
            .into_fields()
            .map_err(|e| ProfileError::Validation(describe(&e)))?;

        if self.repo.find_by_user(user_id).await?.is_some() {
            return Err(ProfileError::Conflict);
        }

        let model = self.repo.insert(user_id, fields).await.map_err(conflict)?;
        self.refresh_cache(&model).await?;

        info!(user_id, profile_id = %model.id, "profile created");
        Ok(model.into())
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        input: ProfileInput,
    ) -> Result<ProfileView, ProfileError> {
        let fields = input
            .into_fields()
            .map_err(|e| ProfileError::Validation(describe(&e)))?;

        let existing = self.owned(user_id, id).await?;
        let model = self.repo.update(existing, fields).await?;
        self.refresh_cache(&model).await?;

        info!(user_id, profile_id = %id, version = model.agent_profile_version, "profile updated");
        Ok(model.into())
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<ProfileView>, ProfileError> {
        Ok(self
            .repo
            .list_by_user(user_id)
            .await?
            .into_iter()
            .map(ProfileView::from)
            .collect())
    }

    pub async fn view(&self, user_id: &str, id: Uuid) -> Result<ProfileView, ProfileError> {
        Ok(self.owned(user_id, id).await?.into())
    }

    /// Drops the cached snapshot, then deletes the profile. The snapshot
    /// never outlives its row.
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), ProfileError> {
        self.owned(user_id, id).await?;
        self.cache.remove(&profile_key(user_id)).await?;
        self.repo.delete(id).await?;

        info!(user_id, profile_id = %id, "profile deleted");
        Ok(())
    }

    async fn owned(&self, user_id: &str, id: Uuid) -> Result<ProfileModel, ProfileError> {
        let model = self.repo.find_by_id(id).await?.ok_or(ProfileError::NotFound)?;
        if model.user_id != user_id {
            warn!(user_id, profile_id = %id, "rejected access to another user's profile");
            return Err(ProfileError::Forbidden);
        }
        Ok(model)
    }

    async fn refresh_cache(&self, model: &ProfileModel) -> Result<(), ProfileError> {
        let document = CompactProfile::from_model(model)
            .to_bytes()
            .map_err(|e| CacheError::Encode(e.to_string()))?;

        self.cache
            .set(&profile_key(&model.user_id), &document, PROFILE_TTL)
            .await?;
        Ok(())
    }
}

// A concurrent insert for the same user trips the unique index
fn conflict(err: DbErr) -> ProfileError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ProfileError::Conflict,
        _ => ProfileError::Database(err),
    }
}
