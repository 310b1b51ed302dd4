use sea_orm::prelude::Json;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use super::compact::list_to_json;

fn default_language() -> String {
    "en".to_string()
}

/// Profile form submission.
///
/// Strings are trimmed before validation, so whitespace-only values count as
/// empty. Learning style is a single choice and is stored as a one-element
/// list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Nickname must be between 1 and 50 characters."))]
    pub nickname: String,

    #[serde(default = "default_language")]
    #[validate(length(min = 1, max = 10, message = "Preferred language must be between 1 and 10 characters."))]
    pub preferred_language: String,

    #[serde(default)]
    #[validate(length(max = 30, message = "Tone must be at most 30 characters."))]
    pub tone_preference: Option<String>,

    #[serde(default)]
    #[validate(length(max = 300, message = "Learning goals must be at most 300 characters."))]
    pub learning_goals: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Favorite authors must be at most 200 characters."))]
    pub favorite_authors: Option<String>,

    #[serde(default)]
    #[validate(length(max = 400, message = "About me must be at most 400 characters."))]
    pub about_me: Option<String>,

    #[serde(default)]
    pub reading_languages: Vec<String>,

    #[serde(default)]
    pub learning_style: Option<String>,

    #[serde(default)]
    pub loved_genres: Vec<String>,

    #[serde(default)]
    pub disliked_genres: Vec<String>,
}

/// Validated, normalized column values for a profile row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub nickname: String,
    pub preferred_language: String,
    pub tone_preference: Option<String>,
    pub learning_goals: Option<String>,
    pub favorite_authors: Option<String>,
    pub about_me: Option<String>,
    pub reading_languages: Option<Json>,
    pub learning_style: Option<Json>,
    pub loved_genres: Option<Json>,
    pub disliked_genres: Option<Json>,
}

impl ProfileInput {
    pub fn into_fields(self) -> Result<ProfileFields, ValidationErrors> {
        let input = self.normalized();
        input.validate()?;

        Ok(ProfileFields {
            nickname: input.nickname,
            preferred_language: input.preferred_language,
            tone_preference: input.tone_preference,
            learning_goals: input.learning_goals,
            favorite_authors: input.favorite_authors,
            about_me: input.about_me,
            reading_languages: list_to_json(input.reading_languages),
            learning_style: list_to_json(input.learning_style.into_iter().collect()),
            loved_genres: list_to_json(input.loved_genres),
            disliked_genres: list_to_json(input.disliked_genres),
        })
    }

    fn normalized(self) -> Self {
        Self {
            nickname: self.nickname.trim().to_string(),
            preferred_language: self.preferred_language.trim().to_string(),
            tone_preference: trimmed(self.tone_preference),
            learning_goals: trimmed(self.learning_goals),
            favorite_authors: trimmed(self.favorite_authors),
            about_me: trimmed(self.about_me),
            reading_languages: trimmed_list(self.reading_languages),
            learning_style: trimmed(self.learning_style),
            loved_genres: trimmed_list(self.loved_genres),
            disliked_genres: trimmed_list(self.disliked_genres),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn trimmed_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|s| trimmed(Some(s)))
        .collect()
}

/// Flattens validator output into one user-facing sentence list.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid."),
            })
        })
        .collect();
    messages.sort();
    messages.join(" ")
}
