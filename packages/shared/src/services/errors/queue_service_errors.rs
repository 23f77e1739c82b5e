use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::errors::player_repository_errors::PlayerRepositoryError;
use crate::repositories::errors::queue_repository_errors::QueueRepositoryError;

#[derive(Debug)]
pub enum QueueServiceError {
    AlreadyInQueue,
    QueueRepository(QueueRepositoryError),
    MatchRepository(MatchRepositoryError),
    PlayerRepository(PlayerRepositoryError),
}

impl std::fmt::Display for QueueServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueServiceError::AlreadyInQueue => {
                write!(f, "Player already has an active queue entry")
            }
            QueueServiceError::QueueRepository(err) => write!(f, "Queue repository error: {}", err),
            QueueServiceError::MatchRepository(err) => write!(f, "Match repository error: {}", err),
            QueueServiceError::PlayerRepository(err) => {
                write!(f, "Player repository error: {}", err)
            }
        }
    }
}

impl std::error::Error for QueueServiceError {}

impl From<QueueRepositoryError> for QueueServiceError {
    fn from(err: QueueRepositoryError) -> Self {
        match err {
            QueueRepositoryError::AlreadyExists => QueueServiceError::AlreadyInQueue,
            other => QueueServiceError::QueueRepository(other),
        }
    }
}

impl From<MatchRepositoryError> for QueueServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        QueueServiceError::MatchRepository(err)
    }
}

impl From<PlayerRepositoryError> for QueueServiceError {
    fn from(err: PlayerRepositoryError) -> Self {
        QueueServiceError::PlayerRepository(err)
    }
}
