//! Citation aggregation over a chat transcript.
//!
//! Turns the per-message [`RawReference`]s of a transcript into a
//! deduplicated, stably numbered source list and a per-message index map.
//! The function is pure: the same transcript always produces the same
//! [`Aggregation`], and no part of the input is aliased into the output.
//!
//! # Algorithm
//!
//! 1. Order messages by `sequence` (stable, so equal sequences keep their
//!    input order).
//! 2. **Grouping pass.** Walk every reference in order. Malformed references
//!    (missing document id or chunk index) are skipped. The first reference
//!    to a document creates its [`Citation`] with the next free index; the
//!    first reference to a chunk of that document adds a [`ChunkUse`].
//!    Later references to the same chunk are dropped.
//! 3. Sort each citation's chunks once: score (desc), chunk index (asc).
//! 4. **Projection pass.** Fold each message's contributions into the
//!    [`MessageCitationMap`] as an ascending, duplicate-free index list.
//!
//! Grouping is per document: every chunk of a document lands in the same
//! citation, and the same index is used by both the panel and the badges.
//!
//! # Example
//!
//! ```rust
//! use nexus_sources_core::aggregate::aggregate;
//! use nexus_sources_core::models::{Message, RawReference, Role};
//!
//! let messages = vec![Message::new("m1", Role::Assistant, 1).with_references(vec![
//!     RawReference::new("D1", 0).with_score(0.9),
//!     RawReference::new("D1", 2).with_score(0.4),
//! ])];
//!
//! let agg = aggregate(&messages);
//! assert_eq!(agg.sources.len(), 1);
//! assert_eq!(agg.sources[0].chunks.len(), 2);
//! assert_eq!(agg.indices_for("m1"), &[0]);
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{Aggregation, ChunkUse, Citation, Message, MessageCitationMap, RawReference};

/// Aggregate a transcript into its source list and message map.
///
/// `messages` may be empty and may arrive out of `sequence` order.
pub fn aggregate(messages: &[Message]) -> Aggregation {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.sequence);

    let (sources, contributions) = group_references(&ordered);
    let message_map = project_indices(contributions);

    Aggregation {
        sources,
        message_map,
    }
}

/// Indices one message contributed to, in first-use order.
struct Contribution<'a> {
    message_id: &'a str,
    indices: Vec<usize>,
}

fn group_references<'a>(ordered: &[&'a Message]) -> (Vec<Citation>, Vec<Contribution<'a>>) {
    let mut sources: Vec<Citation> = Vec::new();
    let mut by_document: HashMap<&'a str, usize> = HashMap::new();
    let mut seen_chunks: Vec<HashSet<i64>> = Vec::new();
    let mut contributions = Vec::new();

    for &message in ordered {
        let mut indices: Vec<usize> = Vec::new();

        for reference in &message.references {
            let Some((document_id, chunk_index)) = reference.key() else {
                continue;
            };

            let index = match by_document.get(document_id) {
                Some(&index) => index,
                None => {
                    let index = sources.len();
                    sources.push(Citation {
                        citation_index: index,
                        document_id: document_id.to_string(),
                        document_name: None,
                        chunks: Vec::new(),
                    });
                    seen_chunks.push(HashSet::new());
                    by_document.insert(document_id, index);
                    index
                }
            };

            let citation = &mut sources[index];
            if citation.document_name.is_none() {
                citation.document_name = named(reference);
            }
            if seen_chunks[index].insert(chunk_index) {
                citation.chunks.push(ChunkUse {
                    chunk_index,
                    relevance_score: score_of(reference),
                    content_preview: reference.content_preview.clone().unwrap_or_default(),
                });
            }

            if !indices.contains(&index) {
                indices.push(index);
            }
        }

        if !indices.is_empty() {
            contributions.push(Contribution {
                message_id: message.id.as_str(),
                indices,
            });
        }
    }

    for citation in &mut sources {
        citation.chunks.sort_by(compare_chunks);
    }

    (sources, contributions)
}

fn project_indices(contributions: Vec<Contribution<'_>>) -> MessageCitationMap {
    let mut map = MessageCitationMap::new();

    for contribution in contributions {
        // Repeated message ids share one entry.
        let entry = map.entry(contribution.message_id.to_string()).or_default();
        entry.extend(contribution.indices);
    }

    for indices in map.values_mut() {
        indices.sort_unstable();
        indices.dedup();
    }

    map
}

/// Score (desc), then chunk index (asc).
fn compare_chunks(a: &ChunkUse, b: &ChunkUse) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then(a.chunk_index.cmp(&b.chunk_index))
}

fn score_of(reference: &RawReference) -> f64 {
    match reference.relevance_score {
        // -0.0 would otherwise order below 0.0 under total_cmp
        Some(s) if s.is_finite() && s != 0.0 => s,
        _ => 0.0,
    }
}

/// The reference's document name as received, unless it is blank.
fn named(reference: &RawReference) -> Option<String> {
    reference
        .document_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
}
