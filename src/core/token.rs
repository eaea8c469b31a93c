//! Token normalisation for free-text names
//!
//! Two forms are produced from a raw string:
//! - a display string ([`normalise`]) with whitespace collapsed but case and
//!   punctuation preserved
//! - a lookup token ([`tokenize`]) that is lowercase, punctuation-free and
//!   bounded in length, used only as a table key

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a lookup token, in characters
pub const MAX_TOKEN_LEN: usize = 64;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Collapse runs of whitespace and trim the ends
///
/// Returns `None` for missing input or input that is blank after trimming.
pub fn normalise(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    Some(WHITESPACE.replace_all(s, " ").into_owned())
}

/// Same as [`normalise`] for a plain `&str`
pub fn normalise_str(s: &str) -> Option<String> {
    normalise(Some(s))
}

/// Make a lookup token from a string
///
/// Lowercases, replaces every run of non-word characters with one space,
/// trims, and truncates to [`MAX_TOKEN_LEN`] characters.
pub fn tokenize(s: &str) -> String {
    let replaced = NON_WORD.replace_all(s, " ").to_lowercase();
    let trimmed = replaced.trim();
    let truncated: String = trimmed.chars().take(MAX_TOKEN_LEN).collect();
    truncated.trim_end().to_string()
}

/// Make an entity stub from its primary key
pub fn make_stub(key: &str) -> String {
    tokenize(key)
}

/// True when the value is missing or blank
pub fn is_empty(s: Option<&str>) -> bool {
    s.map_or(true, |v| v.trim().is_empty())
}
