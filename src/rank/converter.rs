//! Conversion between rating points and traditional Go ranks
//!
//! The scale starts at 25k with 0 points and climbs one rank every
//! `POINTS_PER_RANK` points. Dan ranks saturate at 9d.

use crate::error::LadderError;
use crate::types::{RankLabel, RatingPoints};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Width of one rank band in rating points
pub const POINTS_PER_RANK: RatingPoints = 13;

/// Number of kyu ranks (25k..1k)
pub const KYU_LEVELS: u8 = 25;

/// Strongest dan rank
pub const MAX_DAN: u8 = 9;

/// Placement of a newly seeded player inside their rank band
pub const SEED_OFFSET: RatingPoints = 7;

/// Rank substituted when a self-reported rank cannot be parsed
pub const DEFAULT_SEED_RANK: RankLabel = RankLabel::Kyu(15);

/// First rating that maps to the top rank
pub const MAX_RANK_THRESHOLD: RatingPoints =
    (KYU_LEVELS as RatingPoints - 1 + MAX_DAN as RatingPoints) * POINTS_PER_RANK;

fn rank_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<kyu>[1-9][0-9]?)k|(?P<dan>[1-9])d)$").expect("valid rank pattern")
    })
}

impl FromStr for RankLabel {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LadderError::InvalidRankFormat {
            input: s.to_string(),
        };

        let captures = rank_pattern().captures(s).ok_or_else(invalid)?;

        if let Some(kyu) = captures.name("kyu") {
            let level: u8 = kyu.as_str().parse().map_err(|_| invalid())?;
            return RankLabel::kyu(level).map_err(|_| invalid());
        }

        match captures.name("dan") {
            Some(dan) => {
                let level: u8 = dan.as_str().parse().map_err(|_| invalid())?;
                RankLabel::dan(level).map_err(|_| invalid())
            }
            None => Err(invalid()),
        }
    }
}

/// Map rating points to the rank band they fall in
pub fn rating_to_rank(points: RatingPoints) -> RankLabel {
    let index = points / POINTS_PER_RANK;
    let last_kyu_index = RatingPoints::from(KYU_LEVELS) - 1;

    if index <= last_kyu_index {
        RankLabel::Kyu((RatingPoints::from(KYU_LEVELS) - index) as u8)
    } else {
        let dan = (index - last_kyu_index).min(RatingPoints::from(MAX_DAN));
        RankLabel::Dan(dan as u8)
    }
}

fn seed_points(rank: RankLabel) -> RatingPoints {
    rank.step() * POINTS_PER_RANK + SEED_OFFSET
}

/// Initial rating for a player of the given rank, placed mid-band
///
/// Fails for labels off the 25k..9d scale.
pub fn seed_rating(rank: RankLabel) -> Result<RatingPoints, LadderError> {
    rank.validate().map(seed_points)
}

/// Parse a self-reported rank and return its seed rating
pub fn rank_to_rating(rank: &str) -> Result<RatingPoints, LadderError> {
    rank.parse::<RankLabel>().map(seed_points)
}

/// Parse a self-reported rank, falling back to `DEFAULT_SEED_RANK`
///
/// Returns the rank actually used alongside its seed rating.
pub fn seed_from_reported_rank(rank: &str) -> (RankLabel, RatingPoints) {
    match rank.parse::<RankLabel>() {
        Ok(label) => (label, seed_points(label)),
        Err(e) => {
            warn!("{}; seeding as {}", e, DEFAULT_SEED_RANK);
            (DEFAULT_SEED_RANK, seed_points(DEFAULT_SEED_RANK))
        }
    }
}
