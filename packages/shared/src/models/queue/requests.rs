use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinQueueRequest {
    pub player_id: String,
    pub event_type: String,
}

/// A player has at most one queue entry across all events, so leaving
/// needs no event name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeaveQueueRequest {
    pub player_id: String,
}
