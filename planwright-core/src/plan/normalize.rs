//! Markdown decoration stripping and comparison normalization

use std::sync::LazyLock;

use regex::Regex;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link pattern"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("code pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").expect("bold pattern"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("italic pattern"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_]+)_\b").expect("italic pattern"));
// Unpaired markers left behind by text truncated mid-stream
static STRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__|`").expect("stray pattern"));

/// Remove bold, italic, code and link markers, keeping link labels
pub fn strip_decoration(text: &str) -> String {
    let text = LINK.replace_all(text, "${1}");
    let text = CODE.replace_all(&text, "${1}");
    let text = BOLD.replace_all(&text, "${1}${2}");
    let text = ITALIC_STAR.replace_all(&text, "${1}");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "${1}");
    let text = STRAY.replace_all(&text, "");
    text.trim().to_string()
}

/// Normalize text for duplicate comparison
///
/// Strips decoration, lowercases, turns punctuation into spaces and
/// collapses whitespace.
pub fn normalize_for_comparison(text: &str) -> String {
    let stripped = strip_decoration(text).to_lowercase();
    let spaced: String = stripped
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
