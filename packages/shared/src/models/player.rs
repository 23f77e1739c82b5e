use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Skill-rating state for one player. Created with defaults on first profile
/// creation and mutated only by the rating engine after a completed match.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerRating {
    pub player_id: String,
    pub rating: i32,
    pub games_played: u32,
    pub peak_rating: i32,
    pub rating_deviation: f64,
    pub created_at: DateTime<Utc>,
}

impl PlayerRating {
    pub fn new(player_id: &str) -> Self {
        PlayerRating {
            player_id: player_id.to_string(),
            rating: 1500,
            games_played: 0,
            peak_rating: 1500,
            rating_deviation: 350.0,
            created_at: Utc::now(),
        }
    }

    /// Applies a post-match rating, keeping `peak_rating` monotonic.
    pub fn apply_result(&mut self, new_rating: i32) {
        self.rating = new_rating;
        self.games_played += 1;
        if new_rating > self.peak_rating {
            self.peak_rating = new_rating;
        }
    }
}
