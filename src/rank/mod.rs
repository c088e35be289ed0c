//! Rank conversion and rank-change hysteresis
//!
//! This module maps rating points onto kyu/dan ranks and gates how often the
//! displayed rank of a player may change.

pub mod converter;
pub mod hysteresis;

// Re-export commonly used types
pub use converter::{
    rank_to_rating, rating_to_rank, seed_from_reported_rank, seed_rating, DEFAULT_SEED_RANK,
    POINTS_PER_RANK,
};
pub use hysteresis::{DisplayRank, RankHysteresis, RankUpdate, DEFAULT_FREEZE_PERIOD};
