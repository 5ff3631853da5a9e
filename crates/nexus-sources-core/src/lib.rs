//! # Nexus Sources Core
//!
//! Pure, WASM-safe logic for Nexus Sources: transcript models, the citation
//! aggregator, its memoizing cache, and presentation helpers.
//!
//! This crate contains no tokio, filesystem I/O, or other native-only
//! dependencies. Every function here is a deterministic transformation over
//! in-memory data.

pub mod aggregate;
pub mod cache;
pub mod display;
pub mod models;
