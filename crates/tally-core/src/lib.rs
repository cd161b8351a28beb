//! Core domain + application logic for tally, a chat moderation/utility bot
//! built around a counting game.
//!
//! This crate is intentionally framework-agnostic. The chat platform, the
//! YouTube API and the liveness HTTP server live behind ports (traits)
//! implemented in adapter crates.

pub mod config;
pub mod counting;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod presence;
pub mod store;
pub mod stream;
pub mod welcome;

pub use errors::{Error, Result};
