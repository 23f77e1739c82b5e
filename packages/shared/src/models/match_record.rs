use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::event_timing::EventType;
use crate::models::state_machine::{MatchStatus, StateHistoryEntry};

/// WMC paper format: 25 rows of 40 digits per page.
pub const ROWS_PER_PAGE: usize = 25;
pub const DIGITS_PER_ROW: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Player1,
    Player2,
    Draw,
}

/// Opaque match payload: the generated digit grid, the authoritative
/// server-side start instant, and the phase durations handed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    /// `[page][row][col]`, each cell a single ASCII digit.
    pub digits: Vec<Vec<Vec<String>>>,
    /// Epoch milliseconds; set when the countdown is armed.
    pub game_start_time: Option<i64>,
    pub countdown_secs: u32,
    pub memorization_secs: u32,
    pub recall_secs: u32,
}

impl GameData {
    pub fn generate(event_type: EventType) -> Self {
        let timing = event_type.timing();
        let mut rng = rand::thread_rng();

        let digits = (0..event_type.pages())
            .map(|_| {
                (0..ROWS_PER_PAGE)
                    .map(|_| {
                        (0..DIGITS_PER_ROW)
                            .map(|_| rng.gen_range(0..=9u8).to_string())
                            .collect()
                    })
                    .collect()
            })
            .collect();

        GameData {
            digits,
            game_start_time: None,
            countdown_secs: timing.countdown_secs,
            memorization_secs: timing.memorization_secs,
            recall_secs: timing.recall_secs,
        }
    }

    pub fn total_digits(&self) -> usize {
        self.digits
            .iter()
            .map(|page| page.iter().map(Vec::len).sum::<usize>())
            .sum()
    }
}

/// Single source of truth for one match's progress. The status only ever
/// advances along the state machine's edges; rating fields are written
/// exactly once, at the transition into `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub match_id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub status: MatchStatus,
    pub event_type: EventType,
    pub player1_score: Option<i32>,
    pub player2_score: Option<i32>,
    pub player1_rating_before: i32,
    pub player2_rating_before: i32,
    pub player1_rating_after: Option<i32>,
    pub player2_rating_after: Option<i32>,
    pub player1_rating_change: Option<i32>,
    pub player2_rating_change: Option<i32>,
    pub game_data: GameData,
    pub started_at: Option<DateTime<Utc>>,
    pub memorization_started_at: Option<DateTime<Utc>>,
    pub recall_started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub winner_id: Option<String>,
    pub result: Option<MatchResult>,
    /// Append-only `(state, timestamp)` log of every successful
    /// transition, kept for audit and disconnection-timing forensics.
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        player1_id: &str,
        player2_id: &str,
        player1_rating: i32,
        player2_rating: i32,
        event_type: EventType,
    ) -> Self {
        let created_at = Utc::now();
        Match {
            match_id: Uuid::new_v4().to_string(),
            player1_id: player1_id.to_string(),
            player2_id: player2_id.to_string(),
            status: MatchStatus::WaitingForPlayers,
            event_type,
            player1_score: None,
            player2_score: None,
            player1_rating_before: player1_rating,
            player2_rating_before: player2_rating,
            player1_rating_after: None,
            player2_rating_after: None,
            player1_rating_change: None,
            player2_rating_change: None,
            game_data: GameData::generate(event_type),
            started_at: None,
            memorization_started_at: None,
            recall_started_at: None,
            completed_at: None,
            winner_id: None,
            result: None,
            state_history: vec![StateHistoryEntry {
                state: MatchStatus::WaitingForPlayers,
                at: created_at,
            }],
            created_at,
        }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.player1_id == player_id {
            Some(&self.player2_id)
        } else if self.player2_id == player_id {
            Some(&self.player1_id)
        } else {
            None
        }
    }
}
