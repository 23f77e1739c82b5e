use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryResult {
    Win,
    Loss,
    Draw,
}

/// One row per player per completed match. Written once at completion and
/// never mutated afterwards; this is the audit trail for rating changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub player_id: String,
    pub match_id: String,
    pub score: i32,
    pub rating_before: i32,
    pub rating_after: i32,
    pub rating_change: i32,
    pub result: HistoryResult,
    pub opponent_id: String,
    pub opponent_rating: i32,
    pub played_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> MatchHistoryEntry {
        MatchHistoryEntry {
            player_id: "p1".to_string(),
            match_id: "match-uuid".to_string(),
            score: 320,
            rating_before: 1500,
            rating_after: 1510,
            rating_change: 10,
            result: HistoryResult::Win,
            opponent_id: "p2".to_string(),
            opponent_rating: 1480,
            played_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let e = entry();
        let serialized = serde_json::to_string(&e).unwrap();
        assert!(serialized.contains("\"win\""));

        let deserialized: MatchHistoryEntry = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.player_id, e.player_id);
        assert_eq!(deserialized.rating_change, 10);
        assert_eq!(deserialized.result, HistoryResult::Win);
    }

    #[test]
    fn test_result_wire_names() {
        assert_eq!(
            serde_json::to_string(&HistoryResult::Loss).unwrap(),
            "\"loss\""
        );
        assert_eq!(
            serde_json::to_string(&HistoryResult::Draw).unwrap(),
            "\"draw\""
        );
    }
}
