//! Best-effort repair of markdown artifacts in AI responses.
//!
//! Both backends are instructed to return raw YAML or raw prose, but
//! neither is contractually guaranteed to comply: responses routinely
//! arrive wrapped in yaml-tagged fences, sometimes with stray prose around
//! them. This module strips that wrapping so the editor never shows fence
//! syntax to the user. It is a repair layer, not a markdown parser, and it
//! never fails: worst case the input comes back essentially unchanged.

use regex::Regex;
use std::sync::OnceLock;

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("fenced block pattern")
    })
}

fn leading_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").expect("leading fence pattern"))
}

fn trailing_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*```$").expect("trailing fence pattern"))
}

fn json_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("json fence pattern"))
}

/// Unwrap a JSON payload that the backend wrapped in a json-tagged fence.
///
/// Deliberately narrower than [`strip`]: it only reacts to an explicit
/// json-tagged fence, so fence markers that happen to live inside JSON
/// string values cannot hijack the extraction. Text without such a fence
/// comes back as-is.
pub fn unwrap_json_fence(text: &str) -> &str {
    match json_fence_re().captures(text) {
        Some(captures) => captures.get(1).map_or(text, |m| m.as_str()),
        None => text,
    }
}

/// Strip code-fence wrapping from `text`.
///
/// If the text contains a complete fence pair anywhere, the content
/// strictly between the first pair is returned trimmed, even when there is
/// prose outside the fences. Otherwise a single leading
/// fence-with-optional-language-tag, a leading bare `markdown` token, and a
/// single trailing fence are removed; interior fences are left alone.
///
/// Idempotent: stripping already-stripped text is a no-op.
pub fn strip(text: &str) -> String {
    if let Some(captures) = fenced_block_re().captures(text) {
        return captures[1].trim().to_string();
    }

    let mut clean = text.trim();
    clean = leading_fence_re()
        .find(clean)
        .map_or(clean, |m| &clean[m.end()..]);
    // Bare token only; a word that merely starts with "markdown" stays put.
    if let Some(rest) = clean.strip_prefix("markdown") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            clean = rest;
        }
    }
    if let Some(m) = trailing_fence_re().find(clean) {
        clean = &clean[..m.start()];
    }
    clean.trim().to_string()
}
