//! Memoized aggregation keyed by transcript fingerprint.
//!
//! The presentation layer re-aggregates on every transcript change. Most of
//! those changes (a re-render, a reload of the same page of messages) leave
//! the references untouched, so [`AggregationCache`] keeps the last result
//! and hands out the same [`Arc`] while the fingerprint is unchanged.
//!
//! The fingerprint is a SHA-256 over the fields the aggregator reads: message
//! id, role, sequence, and every reference field. Message content and
//! timestamps are not part of it.

use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::aggregate::aggregate;
use crate::models::{Aggregation, Message, RawReference};

/// Hex SHA-256 fingerprint of the aggregation-relevant parts of a transcript.
pub fn fingerprint(messages: &[Message]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((messages.len() as u64).to_le_bytes());
    for message in messages {
        update_str(&mut hasher, &message.id);
        update_str(&mut hasher, message.role.as_str());
        hasher.update(message.sequence.to_le_bytes());
        hasher.update((message.references.len() as u64).to_le_bytes());
        for reference in &message.references {
            update_reference(&mut hasher, reference);
        }
    }
    format!("{:x}", hasher.finalize())
}

fn update_reference(hasher: &mut Sha256, reference: &RawReference) {
    update_opt_str(hasher, reference.document_id.as_deref());
    update_opt_str(hasher, reference.document_name.as_deref());
    match reference.chunk_index {
        Some(i) => {
            hasher.update([1u8]);
            hasher.update(i.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    match reference.relevance_score {
        Some(s) => {
            hasher.update([1u8]);
            hasher.update(s.to_bits().to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    update_opt_str(hasher, reference.content_preview.as_deref());
}

fn update_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn update_opt_str(hasher: &mut Sha256, s: Option<&str>) {
    match s {
        Some(s) => {
            hasher.update([1u8]);
            update_str(hasher, s);
        }
        None => hasher.update([0u8]),
    }
}

struct Slot {
    fingerprint: String,
    aggregation: Arc<Aggregation>,
}

/// Single-slot memo for [`aggregate`]. Safe to share across threads.
#[derive(Default)]
pub struct AggregationCache {
    slot: Mutex<Option<Slot>>,
}

impl AggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached aggregation if `messages` fingerprints the same as
    /// the last call, otherwise aggregate and replace the slot.
    pub fn get_or_aggregate(&self, messages: &[Message]) -> Arc<Aggregation> {
        let key = fingerprint(messages);

        // The slot is only ever replaced whole, so a poisoned lock is still coherent.
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == key {
                return Arc::clone(&cached.aggregation);
            }
        }

        let aggregation = Arc::new(aggregate(messages));
        *slot = Some(Slot {
            fingerprint: key,
            aggregation: Arc::clone(&aggregation),
        });
        aggregation
    }

    /// Fingerprint of the cached transcript, if any.
    pub fn cached_fingerprint(&self) -> Option<String> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|s| s.fingerprint.clone())
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}
