//! Compact profile document.
//!
//! The denormalized snapshot written to `agentprofile:{user}` on every profile
//! write and read back by the chat path. Null fields are omitted.

use sea_orm::prelude::Json;
use serde::{Deserialize, Serialize};

use crate::entity::user_profile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_v: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loved_genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disliked_genres: Option<Vec<String>>,
}

impl CompactProfile {
    pub fn from_model(model: &user_profile::Model) -> Self {
        Self {
            profile_v: Some(model.agent_profile_version),
            nickname: Some(model.nickname.clone()),
            preferred_language: Some(model.preferred_language.clone()),
            tone: model.tone_preference.clone(),
            learning_goals: model.learning_goals.clone(),
            favorite_authors: model.favorite_authors.clone(),
            about_me: model.about_me.clone(),
            reading_languages: json_to_list(model.reading_languages.as_ref()),
            learning_style: json_to_list(model.learning_style.as_ref()),
            loved_genres: json_to_list(model.loved_genres.as_ref()),
            disliked_genres: json_to_list(model.disliked_genres.as_ref()),
        }
    }

    /// Parses a cached document. Anything that is not a JSON object with the
    /// expected field types yields `None`.
    pub fn parse(document: &[u8]) -> Option<Self> {
        serde_json::from_slice(document).ok()
    }

    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or_else(|_| Json::Object(Default::default()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// True when no field carries anything to personalize with.
    pub fn is_blank(&self) -> bool {
        let texts = [
            &self.nickname,
            &self.preferred_language,
            &self.tone,
            &self.learning_goals,
            &self.favorite_authors,
            &self.about_me,
        ];
        let lists = [
            &self.reading_languages,
            &self.learning_style,
            &self.loved_genres,
            &self.disliked_genres,
        ];

        texts.iter().all(|t| t.as_deref().map_or(true, |s| s.trim().is_empty()))
            && lists
                .iter()
                .all(|l| l.as_ref().map_or(true, |v| v.iter().all(|s| s.trim().is_empty())))
    }
}

/// Reads a stored JSON string array, skipping non-string entries.
pub fn json_to_list(value: Option<&Json>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(|item| item.as_str().map(str::to_owned))
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Stores a list as a JSON array, or NULL when there is nothing to store.
pub fn list_to_json(values: Vec<String>) -> Option<Json> {
    if values.is_empty() {
        None
    } else {
        Some(Json::from(values))
    }
}
