//! User profile entity model.
//!
//! One row per user identity. List-valued preferences are JSON arrays and are
//! stored as NULL rather than `[]` when empty. `agent_profile_compact` holds the
//! denormalized summary that is also written to the profile cache.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model for the `user_profile` table.
///
/// | Column                | Type                 | Notes                      |
/// |-----------------------|----------------------|----------------------------|
/// | id                    | UUID (Primary Key)   |                            |
/// | user_id               | TEXT (unique)        | identity provider subject  |
/// | nickname              | VARCHAR(50)          | required                   |
/// | preferred_language    | VARCHAR(10)          | required, defaults to `en` |
/// | reading_languages     | JSONB                | nullable string array      |
/// | learning_style        | JSONB                | nullable string array      |
/// | loved_genres          | JSONB                | nullable string array      |
/// | disliked_genres       | JSONB                | nullable string array      |
/// | tone_preference       | VARCHAR(30)          | nullable                   |
/// | learning_goals        | VARCHAR(300)         | nullable                   |
/// | favorite_authors      | VARCHAR(200)         | nullable                   |
/// | about_me              | VARCHAR(400)         | nullable                   |
/// | agent_profile_compact | JSONB                | defaults to `{}`           |
/// | agent_profile_version | INTEGER              | bumped on every update     |
/// | created_at            | TIMESTAMPTZ          |                            |
/// | updated_at            | TIMESTAMPTZ          |                            |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique, column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub nickname: String,
    #[sea_orm(column_type = "String(StringLen::N(10))")]
    pub preferred_language: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub reading_languages: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub learning_style: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub loved_genres: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub disliked_genres: Option<Json>,
    #[sea_orm(column_type = "String(StringLen::N(30))", nullable)]
    pub tone_preference: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(300))", nullable)]
    pub learning_goals: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(200))", nullable)]
    pub favorite_authors: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(400))", nullable)]
    pub about_me: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub agent_profile_compact: Json,
    pub agent_profile_version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
