//! Post-pass normalization of rendered Markdown.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize a rendered document.
///
/// Trailing whitespace is trimmed on every line (so whitespace-only lines
/// become empty), runs of 3+ newlines collapse to exactly 2, and the whole
/// document is trimmed. NFC normalization runs first when enabled.
pub fn normalize(text: &str, normalize_unicode: bool) -> String {
    let text = text.replace("\r\n", "\n");
    let text: String = if normalize_unicode {
        text.nfc().collect()
    } else {
        text
    };
    let trimmed = trim_line_ends(&text);
    let collapsed = EXCESS_NEWLINES.replace_all(&trimmed, "\n\n");
    collapsed.trim().to_string()
}

fn trim_line_ends(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
