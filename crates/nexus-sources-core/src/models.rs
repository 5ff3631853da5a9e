//! Transcript and citation data models.
//!
//! [`Message`] and [`RawReference`] describe what the chat transport hands
//! over after normalization. [`Citation`], [`ChunkUse`] and
//! [`MessageCitationMap`] are what the aggregator produces for the source
//! panel and the inline badges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Author of a chat message. Roles this crate does not know (tool output,
/// future agent roles) deserialize as [`Role::Other`] and still take part in
/// aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Other => "other",
        }
    }
}

/// A pointer from a generated message to one document chunk.
///
/// `document_id` and `chunk_index` are required for the reference to be
/// usable. They are optional here so that malformed payloads can still be
/// represented and then dropped by the aggregator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawReference {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub content_preview: Option<String>,
}

impl RawReference {
    /// Build a well-formed reference.
    pub fn new(document_id: impl Into<String>, chunk_index: i64) -> Self {
        Self {
            document_id: Some(document_id.into()),
            chunk_index: Some(chunk_index),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.relevance_score = Some(score);
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.content_preview = Some(preview.into());
        self
    }

    /// The `(document_id, chunk_index)` grouping key, or `None` when the
    /// reference is missing either part. Blank document ids count as missing.
    pub fn key(&self) -> Option<(&str, i64)> {
        let document_id = self.document_id.as_deref()?;
        if document_id.trim().is_empty() {
            return None;
        }
        Some((document_id, self.chunk_index?))
    }
}

/// One message of a chat transcript.
///
/// `sequence` is monotonic within a transcript and defines its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub sequence: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub references: Vec<RawReference>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, sequence: i64) -> Self {
        Self {
            id: id.into(),
            role,
            sequence,
            content: String::new(),
            created_at: None,
            references: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_references(mut self, references: Vec<RawReference>) -> Self {
        self.references = references;
        self
    }
}

/// One distinct chunk contributing evidence to a [`Citation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkUse {
    pub chunk_index: i64,
    /// `0.0` when the reference carried no (finite) score.
    pub relevance_score: f64,
    /// Empty when the reference carried no preview.
    pub content_preview: String,
}

/// A document-level source entry, as listed in the source panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 0-based, equal to the citation's position in the source list.
    pub citation_index: usize,
    pub document_id: String,
    pub document_name: Option<String>,
    /// Never empty. Sorted by score (desc), then chunk index (asc).
    pub chunks: Vec<ChunkUse>,
}

impl Citation {
    /// The document name, or `fallback` when the references never named it.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.document_name.as_deref().unwrap_or(fallback)
    }
}

/// Message id → ascending, duplicate-free citation indices.
pub type MessageCitationMap = BTreeMap<String, Vec<usize>>;

/// Result of aggregating one transcript snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    /// Citations in first-occurrence order; `sources[i].citation_index == i`.
    pub sources: Vec<Citation>,
    pub message_map: MessageCitationMap,
}

impl Aggregation {
    /// Look up a citation by its index.
    pub fn citation(&self, index: usize) -> Option<&Citation> {
        self.sources.get(index)
    }

    /// Citation indices a message uses, empty if it cites nothing.
    pub fn indices_for(&self, message_id: &str) -> &[usize] {
        self.message_map
            .get(message_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Total number of distinct chunks across all citations.
    pub fn chunk_count(&self) -> usize {
        self.sources.iter().map(|c| c.chunks.len()).sum()
    }
}
