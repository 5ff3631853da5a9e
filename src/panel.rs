//! Source panel UI state.
//!
//! [`SourcePanel`] is the one writer of the panel's open flag and selected
//! citation. Readers get a [`watch::Receiver`] from [`SourcePanel::subscribe`]
//! and are notified only when the state actually changes. The panel is not
//! `Clone`; whoever owns it owns the writes.

use nexus_sources_core::models::{Aggregation, Citation};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PanelState {
    pub is_open: bool,
    /// 0-based citation index.
    pub selected: Option<usize>,
}

pub struct SourcePanel {
    tx: watch::Sender<PanelState>,
}

impl SourcePanel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PanelState::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> PanelState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.tx.subscribe()
    }

    pub fn toggle(&self) {
        self.update(|s| s.is_open = !s.is_open);
    }

    pub fn open(&self) {
        self.update(|s| s.is_open = true);
    }

    pub fn close(&self) {
        self.update(|s| s.is_open = false);
    }

    /// Select a citation and open the panel.
    ///
    /// The index is not checked against any source list: a selection may
    /// outlive the transcript it was made on.
    pub fn select(&self, index: usize) {
        self.update(|s| {
            s.selected = Some(index);
            s.is_open = true;
        });
    }

    pub fn clear_selection(&self) {
        self.update(|s| s.selected = None);
    }

    /// The selected citation, if the selection exists in `aggregation`.
    pub fn selected_citation<'a>(&self, aggregation: &'a Aggregation) -> Option<&'a Citation> {
        self.snapshot()
            .selected
            .and_then(|index| aggregation.citation(index))
    }

    fn update(&self, f: impl FnOnce(&mut PanelState)) {
        self.tx.send_if_modified(|state| {
            let before = *state;
            f(state);
            *state != before
        });
    }
}

impl Default for SourcePanel {
    fn default() -> Self {
        Self::new()
    }
}
