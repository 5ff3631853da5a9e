//! # Nexus Sources
//!
//! Source citation aggregation for Nexus workspace chats.
//!
//! Assistant messages in a Nexus chat carry references to the document chunks
//! they were generated from. This crate turns a transcript's references into
//! the numbered source list shown in the chat's source panel and the badge
//! indices shown next to each message.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ Transcript  │──▶│  Aggregator  │──▶│ Panel / Badges   │
//! │ JSON export │   │ (core crate) │   │ text or JSON     │
//! └─────────────┘   └──────────────┘   └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`transcript`] | Transcript loading and wire-format normalization |
//! | [`sources`] | Memoized chat sources and CLI commands |
//! | [`panel`] | Source panel state container |
//! | [`render`] | Plain-text panel and badge rendering |
//!
//! The aggregation algorithm itself lives in [`nexus_sources_core`].

pub mod config;
pub mod panel;
pub mod render;
pub mod sources;
pub mod transcript;
