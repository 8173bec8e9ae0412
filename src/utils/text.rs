use std::sync::LazyLock;

use regex::Regex;

/// Control and format characters that are not whitespace (NUL, BEL, zero-width
/// joiners, soft hyphens, BOMs...).
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[\p{Cc}\p{Cf}]--\s]").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Flattens scraped page text into one prompt-friendly line.
///
/// Invisible control/format characters are dropped first so that removing
/// them can never join two whitespace runs; then every whitespace run becomes
/// a single space and the ends are trimmed.
pub fn clean_text(text: &str) -> String {
    let visible = DISALLOWED.replace_all(text, "");
    WHITESPACE_RUN
        .replace_all(&visible, " ")
        .trim()
        .to_string()
}
