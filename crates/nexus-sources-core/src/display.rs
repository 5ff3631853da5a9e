//! Presentation helpers shared by the source panel and inline badges.
//!
//! Citation indices are 0-based internally; everything a reader sees is
//! numbered from 1.

/// Label shown on an inline citation badge, e.g. `[1]` for index `0`.
pub fn badge_label(citation_index: usize) -> String {
    format!("[{}]", citation_index + 1)
}

/// Parse a 1-based badge number back into a citation index.
pub fn parse_badge_number(number: usize) -> Option<usize> {
    number.checked_sub(1)
}

/// Relevance score as a percentage, e.g. `0.4567` → `"45.7%"`.
pub fn format_score(score: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, score * 100.0)
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut. Never splits a multi-byte character.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// `"1 document"` / `"3 documents"`.
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
