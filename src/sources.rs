//! Chat source extraction and the `sources`, `messages` and `show` commands.
//!
//! [`ChatSources`] is what a chat view holds on to: the memoized aggregation
//! of its transcript and the source panel state. The `run_*` functions are
//! the CLI entry points and print to stdout.

use anyhow::{bail, Result};
use nexus_sources_core::cache::AggregationCache;
use nexus_sources_core::display::{badge_label, parse_badge_number};
use nexus_sources_core::models::{Aggregation, Citation, MessageCitationMap, Role};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::panel::{PanelState, SourcePanel};
use crate::render::{render_citation, render_messages, render_panel};
use crate::transcript::{load_transcript, Transcript};

/// Aggregated sources plus panel state for one chat view.
#[derive(Default)]
pub struct ChatSources {
    cache: AggregationCache,
    panel: SourcePanel,
}

impl ChatSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate the transcript, reusing the previous result if its
    /// references have not changed.
    pub fn refresh(&self, transcript: &Transcript) -> Arc<Aggregation> {
        let aggregation = self.cache.get_or_aggregate(&transcript.messages);
        let unusable = transcript.unusable_references();
        if unusable > 0 {
            debug!(
                chat_id = transcript.chat_id.as_deref().unwrap_or("-"),
                dropped_references = unusable,
                "dropped references without a document id or chunk index"
            );
        }
        info!(
            chat_id = transcript.chat_id.as_deref().unwrap_or("-"),
            messages = transcript.messages.len(),
            sources = aggregation.sources.len(),
            chunks = aggregation.chunk_count(),
            "aggregated chat sources"
        );
        aggregation
    }

    pub fn panel(&self) -> &SourcePanel {
        &self.panel
    }
}

/// JSON shape of the `sources` command.
#[derive(Debug, Serialize)]
pub struct SourcesResponse<'a> {
    pub chat_id: Option<&'a str>,
    pub title: Option<&'a str>,
    pub has_sources: bool,
    pub document_count: usize,
    pub total_chunks: usize,
    pub sources: &'a [Citation],
    pub message_map: &'a MessageCitationMap,
}

/// JSON shape of one entry of the `messages` command.
#[derive(Debug, Serialize)]
pub struct MessageBadges<'a> {
    pub id: &'a str,
    pub role: Role,
    pub sequence: i64,
    pub citation_indices: &'a [usize],
    pub labels: Vec<String>,
}

/// JSON shape of the `show` command.
#[derive(Debug, Serialize)]
pub struct ShowResponse<'a> {
    pub panel: PanelState,
    pub citation: &'a Citation,
}

pub fn sources_response<'a>(
    transcript: &'a Transcript,
    aggregation: &'a Aggregation,
) -> SourcesResponse<'a> {
    SourcesResponse {
        chat_id: transcript.chat_id.as_deref(),
        title: transcript.title.as_deref(),
        has_sources: aggregation.has_sources(),
        document_count: aggregation.sources.len(),
        total_chunks: aggregation.chunk_count(),
        sources: &aggregation.sources,
        message_map: &aggregation.message_map,
    }
}

pub fn message_badges<'a>(
    transcript: &'a Transcript,
    aggregation: &'a Aggregation,
) -> Vec<MessageBadges<'a>> {
    let mut ordered: Vec<_> = transcript.messages.iter().collect();
    ordered.sort_by_key(|m| m.sequence);

    ordered
        .into_iter()
        .map(|m| {
            let indices = aggregation.indices_for(&m.id);
            MessageBadges {
                id: &m.id,
                role: m.role,
                sequence: m.sequence,
                citation_indices: indices,
                labels: indices.iter().map(|&i| badge_label(i)).collect(),
            }
        })
        .collect()
}

/// CLI entry point for `sources`.
pub async fn run_sources(config: &Config, path: &Path, json: bool) -> Result<()> {
    let transcript = load_transcript(path).await?;
    let chat = ChatSources::new();
    let aggregation = chat.refresh(&transcript);

    if json {
        let response = sources_response(&transcript, &aggregation);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        if let Some(title) = transcript.title.as_deref() {
            println!("{}", title);
            println!();
        }
        print!("{}", render_panel(&aggregation, &config.display));
    }

    Ok(())
}

/// CLI entry point for `messages`.
pub async fn run_messages(config: &Config, path: &Path, json: bool) -> Result<()> {
    let transcript = load_transcript(path).await?;
    let chat = ChatSources::new();
    let aggregation = chat.refresh(&transcript);

    if json {
        let badges = message_badges(&transcript, &aggregation);
        println!("{}", serde_json::to_string_pretty(&badges)?);
    } else {
        print!(
            "{}",
            render_messages(&transcript.messages, &aggregation, &config.display)
        );
    }

    Ok(())
}

/// CLI entry point for `show`. `number` is the 1-based badge number.
pub async fn run_show(config: &Config, path: &Path, number: usize, json: bool) -> Result<()> {
    let transcript = load_transcript(path).await?;
    let chat = ChatSources::new();
    let aggregation = chat.refresh(&transcript);

    let Some(index) = parse_badge_number(number) else {
        bail!("citation numbers start at 1");
    };
    chat.panel().select(index);

    let Some(citation) = chat.panel().selected_citation(&aggregation) else {
        bail!(
            "no citation {} in transcript ({} available)",
            badge_label(index),
            aggregation.sources.len()
        );
    };

    if json {
        let response = ShowResponse {
            panel: chat.panel().snapshot(),
            citation,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_citation(citation, &config.display));
    }

    Ok(())
}
