//! ELO rating updates with dynamic K-factors and a Glicko-flavored
//! deviation model. Free functions over value types; both players'
//! updates are computed against pre-match ratings, so the order of
//! application never matters.

use serde::{Deserialize, Serialize};

use crate::models::match_record::MatchResult;
use crate::models::player::PlayerRating;

/// Hard floor below which no rating may fall.
pub const RATING_FLOOR: i32 = 100;

/// Maximum rating deviation (a brand-new or long-inactive player).
pub const MAX_RATING_DEVIATION: f64 = 350.0;

/// Glicko inflation constant per inactive period.
pub const DEVIATION_INFLATION_C: f64 = 34.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub new_rating: i32,
    pub rating_change: i32,
    pub expected_score: f64,
    pub k_factor: i32,
}

/// Logistic win probability of the `rating_a` player.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0))
}

/// K=10 once a player has ever reached 2400, K=40 while unproven
/// (< 30 games), K=20 otherwise.
pub fn k_factor(player: &PlayerRating) -> i32 {
    if player.peak_rating >= 2400 {
        10
    } else if player.games_played < 30 {
        40
    } else {
        20
    }
}

pub fn calculate_new_rating(
    current: i32,
    opponent: i32,
    actual_score: f64,
    k: i32,
) -> RatingUpdate {
    let expected = expected_score(current, opponent);
    let change = (k as f64 * (actual_score - expected)).round() as i32;

    RatingUpdate {
        new_rating: (current + change).max(RATING_FLOOR),
        rating_change: change,
        expected_score: expected,
        k_factor: k,
    }
}

/// Computes both players' updates for a match outcome. Each side's
/// expected score uses the other's pre-match rating.
pub fn update_player_ratings(
    player1: &PlayerRating,
    player2: &PlayerRating,
    result: MatchResult,
) -> (RatingUpdate, RatingUpdate) {
    let (score1, score2) = match result {
        MatchResult::Player1 => (1.0, 0.0),
        MatchResult::Player2 => (0.0, 1.0),
        MatchResult::Draw => (0.5, 0.5),
    };

    let update1 = calculate_new_rating(player1.rating, player2.rating, score1, k_factor(player1));
    let update2 = calculate_new_rating(player2.rating, player1.rating, score2, k_factor(player2));

    (update1, update2)
}

/// Rating deviation after `inactive_periods` without play:
/// `min(350, sqrt(rd^2 + c^2 * t))`.
pub fn rating_deviation(current_rd: f64, inactive_periods: u32) -> f64 {
    (current_rd.powi(2) + DEVIATION_INFLATION_C.powi(2) * inactive_periods as f64)
        .sqrt()
        .min(MAX_RATING_DEVIATION)
}

/// 95% confidence band around a rating estimate.
pub fn confidence_interval(rating: i32, rd: f64) -> (i32, i32) {
    let half_width = (2.0 * rd).round() as i32;
    ((rating - half_width).max(RATING_FLOOR), rating + half_width)
}

/// Anti-sandbagging bound: a rating may not fall more than 200 points
/// below the player's historical best. Exposed for callers to enforce.
pub fn rating_floor(peak_rating: i32) -> i32 {
    (peak_rating - 200).max(RATING_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player(rating: i32, games: u32, peak: i32) -> PlayerRating {
        let mut p = PlayerRating::new("p");
        p.rating = rating;
        p.games_played = games;
        p.peak_rating = peak;
        p
    }

    #[test]
    fn test_expected_score_equal_ratings() {
        assert!((expected_score(1500, 1500) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expected_score_400_point_gap() {
        // A 400-point favourite wins ~10/11 of the time.
        let e = expected_score(1900, 1500);
        assert!((e - 10.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_k_factor_selection() {
        assert_eq!(k_factor(&player(1500, 5, 1500)), 40);
        assert_eq!(k_factor(&player(1500, 30, 1500)), 20);
        assert_eq!(k_factor(&player(2300, 200, 2450)), 10);
        // Peak, not current, decides titled status.
        assert_eq!(k_factor(&player(2250, 10, 2400)), 10);
    }

    #[test]
    fn test_even_match_win_moves_half_k() {
        let update = calculate_new_rating(1500, 1500, 1.0, 20);
        assert_eq!(update.rating_change, 10);
        assert_eq!(update.new_rating, 1510);
        assert_eq!(update.k_factor, 20);
    }

    #[test]
    fn test_rating_floor_applied() {
        let update = calculate_new_rating(105, 2000, 0.0, 40);
        assert_eq!(update.new_rating, RATING_FLOOR);
    }

    #[test]
    fn test_update_player_ratings_symmetric_win() {
        let p1 = player(1500, 50, 1600);
        let p2 = player(1500, 50, 1600);

        let (u1, u2) = update_player_ratings(&p1, &p2, MatchResult::Player1);
        assert_eq!(u1.rating_change, 10);
        assert_eq!(u2.rating_change, -10);
        assert_eq!(u1.new_rating, 1510);
        assert_eq!(u2.new_rating, 1490);
    }

    #[test]
    fn test_update_player_ratings_draw_between_unequal() {
        let p1 = player(1600, 50, 1600);
        let p2 = player(1400, 50, 1400);

        let (u1, u2) = update_player_ratings(&p1, &p2, MatchResult::Draw);
        // The favourite loses ground on a draw, the underdog gains it.
        assert!(u1.rating_change < 0);
        assert!(u2.rating_change > 0);
    }

    #[test]
    fn test_mixed_k_factors_resolved_independently() {
        let newcomer = player(1500, 3, 1500);
        let veteran = player(1500, 100, 1500);

        let (u1, u2) = update_player_ratings(&newcomer, &veteran, MatchResult::Player2);
        assert_eq!(u1.k_factor, 40);
        assert_eq!(u2.k_factor, 20);
        assert_eq!(u1.rating_change, -20);
        assert_eq!(u2.rating_change, 10);
    }

    #[test]
    fn test_rating_deviation_inflates_and_caps() {
        let rd = rating_deviation(50.0, 1);
        assert!((rd - (50.0f64.powi(2) + 34.6f64.powi(2)).sqrt()).abs() < 1e-9);

        assert_eq!(rating_deviation(350.0, 10), 350.0);
        assert_eq!(rating_deviation(60.0, 0), 60.0);
    }

    #[test]
    fn test_confidence_interval() {
        assert_eq!(confidence_interval(1500, 50.0), (1400, 1600));
        // Lower bound clamps at the global floor.
        assert_eq!(confidence_interval(150, 100.0), (100, 350));
    }

    #[test]
    fn test_rating_floor_relative_to_peak() {
        assert_eq!(rating_floor(1800), 1600);
        assert_eq!(rating_floor(250), 100);
    }

    proptest! {
        #[test]
        fn prop_expected_scores_sum_to_one(a in 100i32..3000, b in 100i32..3000) {
            let total = expected_score(a, b) + expected_score(b, a);
            prop_assert!((total - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_new_rating_never_below_floor(
            current in 100i32..3000,
            opponent in 100i32..3000,
            outcome in prop::sample::select(vec![0.0f64, 0.5, 1.0]),
            k in prop::sample::select(vec![10i32, 20, 40]),
        ) {
            let update = calculate_new_rating(current, opponent, outcome, k);
            prop_assert!(update.new_rating >= RATING_FLOOR);
        }

        #[test]
        fn prop_zero_sum_with_equal_k(
            r1 in 100i32..2399,
            r2 in 100i32..2399,
        ) {
            let p1 = player(r1, 50, r1);
            let p2 = player(r2, 50, r2);
            let (u1, u2) = update_player_ratings(&p1, &p2, MatchResult::Player1);
            // Same K on both sides: changes mirror within rounding.
            prop_assert!((u1.rating_change + u2.rating_change).abs() <= 1);
        }
    }
}
