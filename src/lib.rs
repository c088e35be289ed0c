//! Zugol - Go ladder tracker
//!
//! This crate converts rating points to kyu/dan ranks, holds displayed ranks
//! steady with a freeze window after each change, and derives handicap stones
//! and komi for a pairing from the two players' ratings.

pub mod config;
pub mod error;
pub mod ladder;
pub mod pairing;
pub mod rank;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LadderError, Result};
pub use types::*;

// Re-export key components
pub use ladder::{InMemoryLadderStore, LadderService, LadderStore};
pub use pairing::PairingCalculator;
pub use rank::RankHysteresis;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
