use crate::models::state_machine::StateTransitionError;
use crate::repositories::errors::history_repository_errors::HistoryRepositoryError;
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::errors::player_repository_errors::PlayerRepositoryError;

#[derive(Debug)]
pub enum MatchServiceError {
    MatchNotFound,
    NotAParticipant(String),
    InvalidTransition(StateTransitionError),
    ValidationError(String),
    MatchRepository(MatchRepositoryError),
    PlayerRepository(PlayerRepositoryError),
    HistoryRepository(HistoryRepositoryError),
}

impl std::fmt::Display for MatchServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchServiceError::MatchNotFound => write!(f, "Match not found"),
            MatchServiceError::NotAParticipant(player_id) => {
                write!(f, "Player {} is not a participant in this match", player_id)
            }
            MatchServiceError::InvalidTransition(err) => write!(f, "{}", err),
            MatchServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            MatchServiceError::MatchRepository(err) => write!(f, "Match repository error: {}", err),
            MatchServiceError::PlayerRepository(err) => {
                write!(f, "Player repository error: {}", err)
            }
            MatchServiceError::HistoryRepository(err) => {
                write!(f, "History repository error: {}", err)
            }
        }
    }
}

impl std::error::Error for MatchServiceError {}

impl From<StateTransitionError> for MatchServiceError {
    fn from(err: StateTransitionError) -> Self {
        MatchServiceError::InvalidTransition(err)
    }
}

impl From<MatchRepositoryError> for MatchServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        match err {
            MatchRepositoryError::NotFound => MatchServiceError::MatchNotFound,
            other => MatchServiceError::MatchRepository(other),
        }
    }
}

impl From<PlayerRepositoryError> for MatchServiceError {
    fn from(err: PlayerRepositoryError) -> Self {
        MatchServiceError::PlayerRepository(err)
    }
}

impl From<HistoryRepositoryError> for MatchServiceError {
    fn from(err: HistoryRepositoryError) -> Self {
        MatchServiceError::HistoryRepository(err)
    }
}
