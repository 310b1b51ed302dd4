use chrono::Utc;
use sea_orm::prelude::Uuid;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::compact::CompactProfile;
use super::input::ProfileFields;
use crate::entity::user_profile::{
    self, ActiveModel as ProfileActiveModel, Entity as ProfileEntity, Model as ProfileModel,
};

/// Sea-ORM access to the `user_profile` table.
///
/// Every write recomputes `agent_profile_compact` from the row being written,
/// so the stored snapshot always matches the columns next to it.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Option<ProfileModel>, DbErr> {
        find_by_user(&self.conn, user_id).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileModel>, DbErr> {
        ProfileEntity::find_by_id(id).one(&self.conn).await
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<ProfileModel>, DbErr> {
        ProfileEntity::find()
            .filter(user_profile::Column::UserId.eq(user_id))
            .order_by_asc(user_profile::Column::CreatedAt)
            .all(&self.conn)
            .await
    }

    /// Inserts a new profile at version 1.
    pub async fn insert(&self, user_id: &str, fields: ProfileFields) -> Result<ProfileModel, DbErr> {
        insert(&self.conn, user_id, fields).await
    }

    /// Overwrites `existing` with `fields` and bumps its version.
    pub async fn update(
        &self,
        existing: ProfileModel,
        fields: ProfileFields,
    ) -> Result<ProfileModel, DbErr> {
        let txn = self.conn.begin().await?;
        let model = update(&txn, existing, fields).await?;
        txn.commit().await?;
        Ok(model)
    }

    /// Creates or updates the caller's profile inside one transaction.
    /// Returns the stored row and whether it was created.
    pub async fn upsert(
        &self,
        user_id: &str,
        fields: ProfileFields,
    ) -> Result<(ProfileModel, bool), DbErr> {
        let txn = self.conn.begin().await?;

        let result = match find_by_user(&txn, user_id).await? {
            Some(existing) => (update(&txn, existing, fields).await?, false),
            None => (insert(&txn, user_id, fields).await?, true),
        };

        txn.commit().await?;
        Ok(result)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = ProfileEntity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

async fn find_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<Option<ProfileModel>, DbErr> {
    ProfileEntity::find()
        .filter(user_profile::Column::UserId.eq(user_id))
        .one(db)
        .await
}

async fn insert<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    fields: ProfileFields,
) -> Result<ProfileModel, DbErr> {
    let now = Utc::now().into();
    let mut model = ProfileModel {
        id: Uuid::new_v4(),
        user_id: user_id.to_owned(),
        nickname: String::new(),
        preferred_language: String::new(),
        reading_languages: None,
        learning_style: None,
        loved_genres: None,
        disliked_genres: None,
        tone_preference: None,
        learning_goals: None,
        favorite_authors: None,
        about_me: None,
        agent_profile_compact: serde_json::json!({}),
        agent_profile_version: 1,
        created_at: now,
        updated_at: now,
    };
    apply(&mut model, fields);
    model.agent_profile_compact = CompactProfile::from_model(&model).to_json();

    to_active(model).insert(db).await
}

// The version is bumped by the UPDATE itself so concurrent writers each
// get their own increment. The snapshot is then rebuilt from the stored row.
async fn update<C: ConnectionTrait>(
    db: &C,
    existing: ProfileModel,
    fields: ProfileFields,
) -> Result<ProfileModel, DbErr> {
    let id = existing.id;
    let version = Expr::col(user_profile::Column::AgentProfileVersion);
    // Rows written before versioning start over at 1
    let bump = Expr::case(version.clone().lte(0), 1).finally(version.add(1));

    let result = ProfileEntity::update_many()
        .set(changes(fields))
        .col_expr(user_profile::Column::AgentProfileVersion, bump.into())
        .filter(user_profile::Column::Id.eq(id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotUpdated);
    }

    let mut stored = ProfileEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user_profile {id}")))?;
    stored.agent_profile_compact = CompactProfile::from_model(&stored).to_json();

    ProfileEntity::update_many()
        .col_expr(
            user_profile::Column::AgentProfileCompact,
            Expr::value(stored.agent_profile_compact.clone()),
        )
        .filter(user_profile::Column::Id.eq(id))
        .exec(db)
        .await?;

    Ok(stored)
}

fn apply(model: &mut ProfileModel, fields: ProfileFields) {
    model.nickname = fields.nickname;
    model.preferred_language = fields.preferred_language;
    model.tone_preference = fields.tone_preference;
    model.learning_goals = fields.learning_goals;
    model.favorite_authors = fields.favorite_authors;
    model.about_me = fields.about_me;
    model.reading_languages = fields.reading_languages;
    model.learning_style = fields.learning_style;
    model.loved_genres = fields.loved_genres;
    model.disliked_genres = fields.disliked_genres;
}

/// The user-editable columns, plus `updated_at`.
fn changes(fields: ProfileFields) -> ProfileActiveModel {
    ProfileActiveModel {
        nickname: Set(fields.nickname),
        preferred_language: Set(fields.preferred_language),
        reading_languages: Set(fields.reading_languages),
        learning_style: Set(fields.learning_style),
        loved_genres: Set(fields.loved_genres),
        disliked_genres: Set(fields.disliked_genres),
        tone_preference: Set(fields.tone_preference),
        learning_goals: Set(fields.learning_goals),
        favorite_authors: Set(fields.favorite_authors),
        about_me: Set(fields.about_me),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

fn to_active(model: ProfileModel) -> ProfileActiveModel {
    ProfileActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        nickname: Set(model.nickname),
        preferred_language: Set(model.preferred_language),
        reading_languages: Set(model.reading_languages),
        learning_style: Set(model.learning_style),
        loved_genres: Set(model.loved_genres),
        disliked_genres: Set(model.disliked_genres),
        tone_preference: Set(model.tone_preference),
        learning_goals: Set(model.learning_goals),
        favorite_authors: Set(model.favorite_authors),
        about_me: Set(model.about_me),
        agent_profile_compact: Set(model.agent_profile_compact),
        agent_profile_version: Set(model.agent_profile_version),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}
