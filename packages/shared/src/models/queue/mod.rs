pub mod requests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event_timing::EventType;

/// Represents a player currently in the matchmaking queue.
/// Each record corresponds to a DynamoDB item keyed by `player_id`, so a
/// player can hold at most one entry across all events; `event_type`
/// backs the GSI the radius search queries. `joined_at` serializes as
/// epoch seconds so store-side age comparisons are numeric.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueEntry {
    pub event_type: EventType,
    pub player_id: String,
    pub rating: i32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub joined_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(player_id: &str, rating: i32, event_type: EventType) -> Self {
        QueueEntry {
            event_type,
            player_id: player_id.to_string(),
            rating,
            joined_at: Utc::now(),
        }
    }

    /// Seconds this entry has been waiting at `now`.
    pub fn wait_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.joined_at).num_seconds().max(0)
    }
}
