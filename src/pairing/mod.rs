//! Game pairing: colors, handicap stones and komi
//!
//! The calculator and the reference table share one handicap/komi formula so
//! a highlighted table cell always matches the computed settings.

pub mod calculator;
pub mod table;

// Re-export commonly used types
pub use calculator::{KomiPolicy, PairingCalculator, PairingConfig, BASE_KOMI};
pub use table::{cell_rating_difference, generate_table, RatingTableRow, TablePosition};
