//! Transcript loading and wire-format normalization.
//!
//! The chat API exports transcripts in snake_case: messages carry
//! `message_index` and `document_refs`, and each reference has a `score`.
//! This module maps that shape onto the core [`Message`] /
//! [`RawReference`] models. Two file layouts are accepted:
//!
//! - a bare JSON array of messages, or
//! - a chat response object `{ "chat": { "id", "title" }, "messages": [...] }`.
//!
//! Field names of the internal model (`sequence`, `references`,
//! `relevance_score`) and the camelCase names of the web client are accepted
//! as aliases.
//!
//! Parsing is field by field so that one bad value never costs more than it
//! has to:
//!
//! - a message without a string `id` is skipped and counted;
//! - an unknown or missing `role` becomes [`Role::Other`];
//! - a missing `message_index` falls back to the message's position in the file;
//! - a reference whose `document_id` or `chunk_index` has the wrong JSON type
//!   is skipped and counted, while one that merely lacks them is passed
//!   through and dropped by the aggregator;
//! - a mistyped score, name or preview is treated as absent.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use nexus_sources_core::models::{Message, RawReference, Role};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

const MESSAGE_INDEX: &[&str] = &["message_index", "sequence", "messageIndex"];
const DOCUMENT_REFS: &[&str] = &["document_refs", "references", "documentRefs"];
const DOCUMENT_ID: &[&str] = &["document_id", "documentId"];
const DOCUMENT_NAME: &[&str] = &["document_name", "documentName"];
const CHUNK_INDEX: &[&str] = &["chunk_index", "chunkIndex"];
const SCORE: &[&str] = &["score", "relevance_score", "relevanceScore"];
const CONTENT_PREVIEW: &[&str] = &["content_preview", "contentPreview"];

/// A normalized transcript ready for aggregation.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub chat_id: Option<String>,
    pub title: Option<String>,
    pub messages: Vec<Message>,
    /// Messages dropped during normalization (not an object, or no usable id).
    pub skipped_messages: usize,
    /// References dropped during normalization because of type errors.
    pub skipped_references: usize,
}

impl Transcript {
    /// References that survived normalization but lack a document id or
    /// chunk index, and so contribute nothing to the aggregation.
    pub fn unusable_references(&self) -> usize {
        self.messages
            .iter()
            .flat_map(|m| &m.references)
            .filter(|r| r.key().is_none())
            .count()
    }
}

#[derive(Debug, Deserialize)]
struct WireChat {
    id: String,
    #[serde(default)]
    title: Option<String>,
}

/// Parse a transcript from its JSON text.
pub fn parse_transcript(json: &str) -> Result<Transcript> {
    let root: Value = serde_json::from_str(json).context("Transcript is not valid JSON")?;

    let (chat, raw_messages) = match root {
        Value::Array(items) => (None, items),
        Value::Object(mut obj) => {
            let chat = match obj.remove("chat") {
                Some(Value::Null) | None => None,
                Some(v) => Some(
                    serde_json::from_value::<WireChat>(v).context("Invalid `chat` object")?,
                ),
            };
            let messages = match obj.remove("messages") {
                Some(Value::Array(items)) => items,
                Some(_) => bail!("`messages` must be an array"),
                None => bail!("Transcript object has no `messages` field"),
            };
            (chat, messages)
        }
        _ => bail!("Transcript must be a JSON array or an object with `messages`"),
    };

    let mut transcript = Transcript {
        chat_id: chat.as_ref().map(|c| c.id.clone()),
        title: chat.and_then(|c| c.title),
        ..Transcript::default()
    };

    for (position, raw) in raw_messages.iter().enumerate() {
        match normalize_message(raw, position, &mut transcript.skipped_references) {
            Some(message) => transcript.messages.push(message),
            None => transcript.skipped_messages += 1,
        }
    }

    debug!(
        messages = transcript.messages.len(),
        skipped_messages = transcript.skipped_messages,
        skipped_references = transcript.skipped_references,
        "transcript parsed"
    );

    Ok(transcript)
}

/// Read and parse a transcript file.
pub async fn load_transcript(path: &Path) -> Result<Transcript> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;

    parse_transcript(&content)
        .with_context(|| format!("Failed to parse transcript: {}", path.display()))
}

/// First of `names` present in `obj`, decoded as `T`. Absent and `null`
/// both give `Ok(None)`.
fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    names: &[&str],
) -> serde_json::Result<Option<T>> {
    match names.iter().find_map(|name| obj.get(*name)) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some),
    }
}

/// Like [`field`], but a value of the wrong type counts as absent.
fn optional<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    names: &[&str],
    message_id: &str,
) -> Option<T> {
    field(obj, names).unwrap_or_else(|e| {
        debug!(message_id, field = names[0], error = %e, "ignoring mistyped field");
        None
    })
}

fn normalize_message(raw: &Value, position: usize, skipped: &mut usize) -> Option<Message> {
    let Some(obj) = raw.as_object() else {
        warn!(position, "skipping message that is not an object");
        return None;
    };

    let id = match field::<String>(obj, &["id"]) {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!(position, "skipping message without an id");
            return None;
        }
        Err(e) => {
            warn!(position, error = %e, "skipping message with a malformed id");
            return None;
        }
    };

    let role = optional::<Role>(obj, &["role"], &id).unwrap_or(Role::Other);
    if role == Role::Other {
        debug!(message_id = %id, "message role not recognized");
    }

    let sequence = match field::<i64>(obj, MESSAGE_INDEX) {
        Ok(Some(sequence)) => sequence,
        Ok(None) | Err(_) => {
            warn!(message_id = %id, position, "message has no usable message_index, using its position");
            position as i64
        }
    };

    let raw_refs = optional::<Vec<Value>>(obj, DOCUMENT_REFS, &id).unwrap_or_default();
    let mut references = Vec::with_capacity(raw_refs.len());
    for raw_ref in &raw_refs {
        match normalize_reference(raw_ref, &id) {
            Some(reference) => references.push(reference),
            None => *skipped += 1,
        }
    }

    Some(Message {
        created_at: optional::<String>(obj, &["created_at"], &id)
            .as_deref()
            .and_then(parse_timestamp),
        content: optional(obj, &["content"], &id).unwrap_or_default(),
        role,
        sequence,
        references,
        id,
    })
}

fn normalize_reference(raw: &Value, message_id: &str) -> Option<RawReference> {
    let Some(obj) = raw.as_object() else {
        warn!(message_id, "dropping document reference that is not an object");
        return None;
    };

    let required = field::<String>(obj, DOCUMENT_ID)
        .and_then(|id| field::<i64>(obj, CHUNK_INDEX).map(|chunk| (id, chunk)));
    let (document_id, chunk_index) = match required {
        Ok(pair) => pair,
        Err(e) => {
            warn!(message_id, error = %e, "dropping malformed document reference");
            return None;
        }
    };

    Some(RawReference {
        document_id,
        chunk_index,
        document_name: optional(obj, DOCUMENT_NAME, message_id),
        relevance_score: optional(obj, SCORE, message_id),
        content_preview: optional(obj, CONTENT_PREVIEW, message_id),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
