//! Ladder management on top of the rank and pairing engine
//!
//! This module provides the storage interface for players and games, the
//! ladder service that keeps rank state consistent, and standings.

pub mod service;
pub mod standings;
pub mod storage;

// Re-export commonly used types
pub use service::{GameReport, LadderService};
pub use standings::{
    build_standings, ActivityFilter, SortDirection, SortField, StandingRow, StandingsSort,
};
pub use storage::{InMemoryLadderStore, LadderStore, VersionedPlayer};
