//! Markdown to HTML for model replies, plus the fixed chat fragments.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Shown in place of a reply when a turn fails.
pub const TURN_FAILED_MESSAGE: &str =
    "⚠️ Sorry, I couldn't get an answer right now. Please try again in a moment.";

const RESET_MESSAGE: &str = "Conversation reset. Your next message starts a new chat.";
const RESET_FAILED_MESSAGE: &str =
    "⚠️ Sorry, the conversation could not be reset right now. Please try again.";

/// Renders model output as HTML safe to inject into the page.
///
/// Raw HTML in the source is escaped rather than passed through, and script
/// URLs in links and images are replaced by `#`.
pub fn markdown_to_html(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let events = Parser::new_ext(text, options).map(sanitize);
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, events);
    out
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|blocked| scheme.starts_with(blocked))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

pub fn bot_message(inner_html: &str) -> String {
    format!(r#"<div class="chat-message bot">{inner_html}</div>"#)
}

pub fn bot_error() -> String {
    format!(r#"<div class="chat-message bot error">{TURN_FAILED_MESSAGE}</div>"#)
}

pub fn reset_confirmation() -> String {
    format!(r#"<div class="chat-notice">{RESET_MESSAGE}</div>"#)
}

pub fn reset_failed() -> String {
    format!(r#"<div class="chat-notice error">{RESET_FAILED_MESSAGE}</div>"#)
}
