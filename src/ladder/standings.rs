//! Ladder standings
//!
//! Positions order active players (at least one recorded game) ahead of
//! inactive ones, then by rating points, highest first.

use crate::error::LadderError;
use crate::rank::{DisplayRank, RankHysteresis};
use crate::types::{Player, PlayerId, RatingPoints};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// Restrict standings to recently active players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFilter {
    All,
    LastMonth,
    LastThreeMonths,
    #[default]
    LastSixMonths,
    LastYear,
}

impl ActivityFilter {
    /// Earliest last-game date that passes the filter
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = match self {
            ActivityFilter::All => return None,
            ActivityFilter::LastMonth => 1,
            ActivityFilter::LastThreeMonths => 3,
            ActivityFilter::LastSixMonths => 6,
            ActivityFilter::LastYear => 12,
        };
        now.checked_sub_months(Months::new(months))
    }

    pub fn accepts(&self, last_game: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self.cutoff(now) {
            None => true,
            Some(cutoff) => last_game.is_some_and(|played| played >= cutoff),
        }
    }
}

impl FromStr for ActivityFilter {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ActivityFilter::All),
            "1month" => Ok(ActivityFilter::LastMonth),
            "3months" => Ok(ActivityFilter::LastThreeMonths),
            "6months" => Ok(ActivityFilter::LastSixMonths),
            "1year" => Ok(ActivityFilter::LastYear),
            _ => Err(LadderError::ConfigurationError {
                message: format!("Unknown activity filter: {}", s),
            }),
        }
    }
}

/// Column the standings are sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Rating,
    Name,
    LastGame,
}

impl FromStr for SortField {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(SortField::Rating),
            "name" => Ok(SortField::Name),
            "last-game" | "last_game" => Ok(SortField::LastGame),
            _ => Err(LadderError::ConfigurationError {
                message: format!("Unknown sort field: {}", s),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StandingsSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// A player and the date of their most recent game
#[derive(Debug, Clone)]
pub struct LadderEntry {
    pub player: Player,
    pub last_game: Option<DateTime<Utc>>,
}

/// One line of the standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    /// Ladder position among all players, starting at 1
    pub position: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub rating_points: RatingPoints,
    pub display_rank: DisplayRank,
    pub last_game_played: Option<DateTime<Utc>>,
}

fn ladder_order(a: &LadderEntry, b: &LadderEntry) -> Ordering {
    b.last_game
        .is_some()
        .cmp(&a.last_game.is_some())
        .then_with(|| b.player.rating_points().cmp(&a.player.rating_points()))
        .then_with(|| a.player.name.to_lowercase().cmp(&b.player.name.to_lowercase()))
        .then_with(|| a.player.id.cmp(&b.player.id))
}

fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn display_order(a: &LadderEntry, b: &LadderEntry, sort: StandingsSort) -> Ordering {
    match sort.field {
        // Active players stay on top whichever way points are sorted
        SortField::Rating => b.last_game.is_some().cmp(&a.last_game.is_some()).then_with(|| {
            apply_direction(
                a.player.rating_points().cmp(&b.player.rating_points()),
                sort.direction,
            )
        }),
        SortField::Name => apply_direction(
            a.player.name.to_lowercase().cmp(&b.player.name.to_lowercase()),
            sort.direction,
        ),
        // Players without games go last in both directions
        SortField::LastGame => match (a.last_game, b.last_game) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a_played), Some(b_played)) => {
                apply_direction(a_played.cmp(&b_played), sort.direction)
            }
        },
    }
}

/// Ladder position of every player, computed over the full ladder
pub fn ladder_positions(entries: &[LadderEntry]) -> HashMap<PlayerId, usize> {
    let mut ordered: Vec<&LadderEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| ladder_order(a, b));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, entry)| (entry.player.id.clone(), index + 1))
        .collect()
}

/// Build the standings table
///
/// Positions always reflect the whole ladder; the filter only hides rows.
pub fn build_standings(
    entries: Vec<LadderEntry>,
    hysteresis: &RankHysteresis,
    filter: ActivityFilter,
    sort: StandingsSort,
    now: DateTime<Utc>,
) -> Vec<StandingRow> {
    let positions = ladder_positions(&entries);

    let mut visible: Vec<LadderEntry> = entries
        .into_iter()
        .filter(|entry| filter.accepts(entry.last_game, now))
        .collect();
    visible.sort_by(|a, b| display_order(a, b, sort));

    visible
        .into_iter()
        .map(|entry| StandingRow {
            position: positions.get(&entry.player.id).copied().unwrap_or_default(),
            display_rank: hysteresis.display_rank(&entry.player.rank_state),
            player_id: entry.player.id,
            name: entry.player.name,
            rating_points: entry.player.rank_state.rating_points,
            last_game_played: entry.last_game,
        })
        .collect()
}
