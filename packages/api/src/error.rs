use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::repositories::errors::player_repository_errors::PlayerRepositoryError;
use shared::services::errors::{
    match_service_errors::MatchServiceError, queue_service_errors::QueueServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    QueueService(QueueServiceError),
    MatchService(MatchServiceError),
    PlayerRepository(PlayerRepositoryError),
}

impl From<QueueServiceError> for ApiError {
    fn from(error: QueueServiceError) -> Self {
        ApiError::QueueService(error)
    }
}

impl From<MatchServiceError> for ApiError {
    fn from(error: MatchServiceError) -> Self {
        ApiError::MatchService(error)
    }
}

impl From<PlayerRepositoryError> for ApiError {
    fn from(error: PlayerRepositoryError) -> Self {
        ApiError::PlayerRepository(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::QueueService(QueueServiceError::AlreadyInQueue) => StatusCode::CONFLICT,
            ApiError::QueueService(
                QueueServiceError::QueueRepository(_)
                | QueueServiceError::MatchRepository(_)
                | QueueServiceError::PlayerRepository(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::MatchService(MatchServiceError::MatchNotFound) => StatusCode::NOT_FOUND,
            ApiError::MatchService(MatchServiceError::NotAParticipant(_)) => StatusCode::FORBIDDEN,
            ApiError::MatchService(
                MatchServiceError::InvalidTransition(_) | MatchServiceError::ValidationError(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::MatchService(
                MatchServiceError::MatchRepository(_)
                | MatchServiceError::PlayerRepository(_)
                | MatchServiceError::HistoryRepository(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::PlayerRepository(PlayerRepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::PlayerRepository(
                PlayerRepositoryError::Serialization(_) | PlayerRepositoryError::DynamoDb(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        status.into_response()
    }
}
