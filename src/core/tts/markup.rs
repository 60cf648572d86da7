//! SSML detection and shaping.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use super::base::SpeechProvider;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static tag pattern"));
static SPEAK_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*<speak\b[^>]*>").expect("static speak pattern"));
static SPEAK_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</speak>\s*$").expect("static speak pattern"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// True when the text is an SSML document.
pub fn is_markup(text: &str) -> bool {
    text.trim_start().starts_with("<speak")
}

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Removes every tag and collapses whitespace.
pub fn strip_markup(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, " ");
    let unescaped = without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(unescaped.trim(), " ").into_owned()
}

/// Content between `<speak ...>` and `</speak>`.
pub fn speak_body(text: &str) -> &str {
    let start = SPEAK_OPEN_RE.find(text).map(|m| m.end()).unwrap_or(0);
    let end = SPEAK_CLOSE_RE
        .find(&text[start..])
        .map(|m| start + m.start())
        .unwrap_or(text.len());
    &text[start..end]
}

/// Text as the provider should receive it: markup passes through to
/// providers that understand it and is flattened for the rest.
pub fn text_for_provider(provider: SpeechProvider, text: &str) -> Cow<'_, str> {
    if is_markup(text) && !provider.supports_markup() {
        Cow::Owned(strip_markup(text))
    } else {
        Cow::Borrowed(text)
    }
}
