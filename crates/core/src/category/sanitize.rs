//! Text clean-up for category segments.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex_lite::{Captures, Regex};

/// Characters that may never appear inside a category segment.
pub const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Punctuation kept in segments besides letters, digits and spaces.
const ALLOWED_PUNCTUATION: &[char] = &['_', '-', '.', '(', ')', '[', ']', '&', '\''];

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("valid entity regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Decode HTML character references (`&#39;`, `&#x27;`, `&amp;`, ...).
///
/// References that do not resolve, and bare ampersands, are left untouched.
pub fn decode_html(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let reference = &caps[0];
        unescape_with(reference, resolve_html5_entity)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| reference.to_string())
    })
}

/// Make `text` safe to use as one level of a category path.
///
/// Removes HTML tags, forbidden and control characters, and anything that
/// is not alphanumeric, whitespace or allowed punctuation, then collapses
/// whitespace runs and trims. Trailing dots are dropped, so `.` and `..`
/// come out empty.
pub fn sanitize_segment(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, "");

    let filtered: String = without_tags
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c))
        .collect();

    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");

    // Windows rejects directory names ending in a dot or space
    collapsed
        .trim_end_matches(|c: char| c == '.' || c == ' ')
        .to_string()
}

/// Accept a year only when it is exactly four ASCII digits.
pub fn normalize_year(year: Option<&str>) -> Option<&str> {
    let year = year?.trim();
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Some(year)
    } else {
        None
    }
}

/// Whether `segment` holds a character that must never reach the client.
pub fn contains_forbidden(segment: &str) -> bool {
    segment
        .chars()
        .any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_control())
}
