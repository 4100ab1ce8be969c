//! Duel - a two-player card game rules engine
//!
//! A deterministic, single-writer engine: clients submit intents through
//! `Match::apply` and read redacted snapshots back.

pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod zones;

pub use error::{DuelError, Result};
