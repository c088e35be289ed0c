//! Reference table of handicap and komi by rating difference
//!
//! Rows are handicap levels (0, then 2 up to the maximum) and the 13 columns
//! are the komi steps inside one rating band. Cell values are the rating
//! differences that lead to that row and column.

use crate::pairing::calculator::{
    KomiPolicy, PairingCalculator, BASE_KOMI, MAX_HANDICAP_STONES,
};
use crate::rank::POINTS_PER_RANK;
use crate::types::{Komi, RatingPoints};
use serde::{Deserialize, Serialize};

/// Columns per row, one per point inside a rating band
pub const TABLE_COLUMNS: usize = POINTS_PER_RANK as usize;

/// One handicap level of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTableRow {
    pub handicap_stones: u8,
    pub komi_values: Vec<Komi>,
}

/// Cell of the table a rating difference falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePosition {
    pub handicap_stones: u8,
    pub komi_index: usize,
}

impl TablePosition {
    /// Row index of this position inside a generated table
    pub fn row_index(&self) -> usize {
        match self.handicap_stones {
            0 => 0,
            stones => usize::from(stones) - 1,
        }
    }
}

/// The 13 komi steps shared by every row: +6.5 down to -5.5
pub fn komi_steps() -> Vec<Komi> {
    (0..TABLE_COLUMNS)
        .map(|position| Komi(BASE_KOMI - position as f64))
        .collect()
}

/// Build the table rows for 0 stones and 2 through `max_handicap` stones
///
/// `max_handicap` is capped at `MAX_HANDICAP_STONES`.
pub fn generate_table(max_handicap: u8) -> Vec<RatingTableRow> {
    let steps = komi_steps();

    std::iter::once(0)
        .chain(2..=max_handicap.min(MAX_HANDICAP_STONES))
        .map(|handicap_stones| RatingTableRow {
            handicap_stones,
            komi_values: steps.clone(),
        })
        .collect()
}

/// Rating difference shown in cell (`row_index`, `col_index`)
pub fn cell_rating_difference(row_index: usize, col_index: usize) -> RatingPoints {
    let col = col_index as RatingPoints;
    if row_index == 0 {
        col
    } else {
        POINTS_PER_RANK + (row_index as RatingPoints - 1) * POINTS_PER_RANK + col
    }
}

impl PairingCalculator {
    /// Rows of the reference table for this calculator's maximum handicap
    pub fn rating_table(&self) -> Vec<RatingTableRow> {
        generate_table(self.config().max_handicap)
    }

    /// Locate a rating difference in the reference table
    ///
    /// Past the last row the unbounded komi policy has no cell to highlight;
    /// the cyclic policy keeps mapping onto the last row.
    pub fn table_position(&self, rating_difference: RatingPoints) -> Option<TablePosition> {
        if rating_difference > self.config().table_limit()
            && self.config().komi_policy == KomiPolicy::Unbounded
        {
            return None;
        }

        Some(TablePosition {
            handicap_stones: self.handicap_stones(rating_difference),
            komi_index: (rating_difference % POINTS_PER_RANK) as usize,
        })
    }
}
