//! Elo-style arena ladder.
//!
//! Ratings move only when a ladder-eligible match completes with a decisive
//! result; draws and PvE fights never touch them.

use serde::{Deserialize, Serialize};

/// Which ladder a rating belongs to. One record exists per
/// (character, ladder).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LadderKind {
    Pvp,
    Arena,
}

/// Elo K-factor.
pub const K_FACTOR: f64 = 32.0;

/// Ratings never drop below this.
pub const RATING_FLOOR: i32 = 1;

/// Starting rating for a character's first ladder match.
pub const INITIAL_RATING: i32 = 1_000;

/// One character's standing on one ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    /// Positive = current win streak, negative = loss streak.
    pub streak: i32,
}

impl Default for RatingRecord {
    fn default() -> Self {
        Self {
            rating: INITIAL_RATING,
            wins: 0,
            losses: 0,
            streak: 0,
        }
    }
}

/// Expected score of `own` against `opponent`.
///
/// `1 / (1 + 10^((opponent - own) / 400))`
pub fn expected_score(own: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - own) as f64 / 400.0))
}

/// Rating points the winner gains (and the loser loses) for a decisive
/// result: `round(K * (1 - expected(winner vs loser)))`.
pub fn rating_delta(winner: i32, loser: i32) -> i32 {
    (K_FACTOR * (1.0 - expected_score(winner, loser))).round() as i32
}

/// Applies a decisive result to both records and returns the delta.
///
/// The winner gains the delta; the loser loses the same magnitude, floored
/// at [`RATING_FLOOR`]. Win/loss counts and streaks update alongside.
pub fn apply_result(winner: &mut RatingRecord, loser: &mut RatingRecord) -> i32 {
    apply_team_result(
        std::slice::from_mut(winner),
        std::slice::from_mut(loser),
    )
}

/// Applies a decisive team result.
///
/// The delta is computed once from the two sides' average ratings and
/// applied uniformly: every winner gains it, every loser loses it (floored
/// at [`RATING_FLOOR`]). For one-member sides this reduces to the plain
/// two-party update. Returns the delta; an empty side is a no-op.
pub fn apply_team_result(winners: &mut [RatingRecord], losers: &mut [RatingRecord]) -> i32 {
    if winners.is_empty() || losers.is_empty() {
        return 0;
    }
    let average = |side: &[RatingRecord]| {
        (side.iter().map(|r| r.rating as i64).sum::<i64>() / side.len() as i64) as i32
    };
    let delta = rating_delta(average(winners), average(losers));

    for winner in winners.iter_mut() {
        winner.rating += delta;
        winner.wins += 1;
        winner.streak = if winner.streak > 0 { winner.streak + 1 } else { 1 };
    }
    for loser in losers.iter_mut() {
        loser.rating = (loser.rating - delta).max(RATING_FLOOR);
        loser.losses += 1;
        loser.streak = if loser.streak < 0 { loser.streak - 1 } else { -1 };
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_split_expectation() {
        assert!((expected_score(1_000, 1_000) - 0.5).abs() < 1e-9);
        assert_eq!(rating_delta(1_000, 1_000), 16);
    }

    #[test]
    fn decisive_result_is_zero_sum_away_from_the_floor() {
        let mut winner = RatingRecord {
            rating: 1_200,
            ..Default::default()
        };
        let mut loser = RatingRecord {
            rating: 1_100,
            ..Default::default()
        };
        let delta = apply_result(&mut winner, &mut loser);
        assert_eq!(winner.rating - 1_200, delta);
        assert_eq!(1_100 - loser.rating, delta);
    }

    #[test]
    fn loser_never_drops_below_the_floor() {
        let mut winner = RatingRecord::default();
        let mut loser = RatingRecord {
            rating: 5,
            ..Default::default()
        };
        apply_result(&mut winner, &mut loser);
        assert_eq!(loser.rating, RATING_FLOOR);
    }

    #[test]
    fn upsets_move_more_points() {
        // Underdog beating a favorite gains more than the reverse.
        let upset = rating_delta(1_000, 1_400);
        let expected_win = rating_delta(1_400, 1_000);
        assert!(upset > expected_win);
        assert_eq!(upset + expected_win, 32); // symmetric around K
    }

    #[test]
    fn streaks_track_consecutive_results() {
        let mut a = RatingRecord::default();
        let mut b = RatingRecord::default();
        apply_result(&mut a, &mut b);
        apply_result(&mut a, &mut b);
        assert_eq!(a.streak, 2);
        assert_eq!(b.streak, -2);

        apply_result(&mut b, &mut a);
        assert_eq!(b.streak, 1);
        assert_eq!(a.streak, -1);
    }
}
