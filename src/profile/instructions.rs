//! Turns a cached compact profile into per-request model instructions.

use super::compact::CompactProfile;

const NOT_SET: &str = "not set";
const UNKNOWN: &str = "unknown";

/// Directives appended verbatim to every instruction block.
pub const BEHAVIOR_DIRECTIVES: &str = "\
Guidelines:
- Answer in the user's preferred language and match their preferred tone.
- Prioritize the user's loved genres and favorite authors when recommending or giving examples.
- Avoid the user's disliked genres unless the user explicitly asks for them.
- If the request is ambiguous, ask at most one short clarifying question before answering.";

/// Builds the instruction block for a compact profile document.
///
/// Returns `None` when there is no document, when it is not a valid profile
/// document, or when it carries no preference at all. The same document always
/// yields the same text.
pub fn build_instructions(document: Option<&[u8]>) -> Option<String> {
    let profile = CompactProfile::parse(document?)?;
    if profile.is_blank() {
        return None;
    }
    Some(render(&profile))
}

fn render(p: &CompactProfile) -> String {
    let version = p
        .profile_v
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    format!(
        "Personalize your answers using this reader profile.\n\
         - Name: {name}\n\
         - Preferred language: {language}\n\
         - Tone: {tone}\n\
         - Reading languages: {reading}\n\
         - Learning style: {style}\n\
         - Loved genres: {loved}\n\
         - Disliked genres: {disliked}\n\
         - Favorite authors: {authors}\n\
         - Learning goals: {goals}\n\
         - About me: {about}\n\
         - Profile version: {version}\n\
         \n\
         {BEHAVIOR_DIRECTIVES}",
        name = text_or(&p.nickname, NOT_SET),
        language = text_or(&p.preferred_language, UNKNOWN),
        tone = text_or(&p.tone, NOT_SET),
        reading = list_or(&p.reading_languages),
        style = list_or(&p.learning_style),
        loved = list_or(&p.loved_genres),
        disliked = list_or(&p.disliked_genres),
        authors = text_or(&p.favorite_authors, NOT_SET),
        goals = text_or(&p.learning_goals, NOT_SET),
        about = text_or(&p.about_me, NOT_SET),
    )
}

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
}

fn list_or(values: &Option<Vec<String>>) -> String {
    let items: Vec<&str> = values
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if items.is_empty() {
        NOT_SET.to_string()
    } else {
        items.join(", ")
    }
}
