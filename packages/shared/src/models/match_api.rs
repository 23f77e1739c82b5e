use serde::{Deserialize, Serialize};

/// Recall submission for one player.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitAnswersRequest {
    pub player_id: String,
    /// Recalled digits, `[page][row][col]`, one ASCII digit or empty per cell.
    pub recalled: Vec<Vec<Vec<String>>>,
}
