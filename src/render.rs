//! Plain-text rendering of the source panel and message badges.

use std::fmt::Write;

use nexus_sources_core::display::{badge_label, format_score, pluralize, truncate_preview};
use nexus_sources_core::models::{Aggregation, Citation, Message};

use crate::config::DisplayConfig;

/// Render the whole source panel: a header and one card per citation.
pub fn render_panel(aggregation: &Aggregation, display: &DisplayConfig) -> String {
    if !aggregation.has_sources() {
        return "No sources referenced\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sources ({})",
        pluralize(aggregation.sources.len(), "document")
    );
    for citation in &aggregation.sources {
        out.push('\n');
        out.push_str(&render_citation(citation, display));
    }
    out
}

/// Render one citation card with its chunk list.
pub fn render_citation(citation: &Citation, display: &DisplayConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        badge_label(citation.citation_index),
        citation.display_name(&display.unknown_document_name)
    );
    let _ = writeln!(out, "    id: {}", citation.document_id);
    let _ = writeln!(out, "    {}", pluralize(citation.chunks.len(), "chunk"));

    for chunk in &citation.chunks {
        let score = format_score(chunk.relevance_score, display.score_decimals);
        if display.show_previews && !chunk.content_preview.is_empty() {
            let preview = truncate_preview(&flatten(&chunk.content_preview), display.preview_chars);
            let _ = writeln!(out, "    - chunk {:<4} {:>7}  {}", chunk.chunk_index, score, preview);
        } else {
            let _ = writeln!(out, "    - chunk {:<4} {:>7}", chunk.chunk_index, score);
        }
    }
    out
}

/// Render each message with the badges of the citations it uses.
pub fn render_messages(
    messages: &[Message],
    aggregation: &Aggregation,
    display: &DisplayConfig,
) -> String {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.sequence);

    let mut out = String::new();
    for message in ordered {
        let content = truncate_preview(&flatten(&message.content), display.preview_chars);
        let _ = writeln!(
            out,
            "#{} {}: {}",
            message.sequence,
            message.role.as_str(),
            content
        );

        let indices = aggregation.indices_for(&message.id);
        if !indices.is_empty() {
            let badges: Vec<String> = indices.iter().map(|&i| badge_label(i)).collect();
            let _ = writeln!(out, "    sources: {}", badges.join(" "));
        }
    }
    out
}

/// Collapse line breaks so a preview stays on one line.
fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
