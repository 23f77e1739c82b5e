use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{debug, error};

use crate::{error::ApiError, state::AppState};
use shared::models::event_timing::EventType;
use shared::models::queue::requests::{JoinQueueRequest, LeaveQueueRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/queue/join", post(join_queue))
        .route("/queue/leave", post(leave_queue))
}

async fn join_queue(
    State(state): State<AppState>,
    Json(payload): Json<JoinQueueRequest>,
) -> Result<StatusCode, ApiError> {
    let event_type = EventType::parse_or_default(&payload.event_type);

    // Current rating record supplies the enqueue snapshot.
    let player = state
        .player_repository
        .get_player(&payload.player_id)
        .await
        .map_err(|e| {
            error!("Failed to load player {}: {}", payload.player_id, e);
            ApiError::from(e)
        })?;

    state
        .queue_service
        .join_queue(&player, event_type)
        .await
        .map_err(|e| {
            error!("Failed to join queue for {}: {}", payload.player_id, e);
            ApiError::from(e)
        })?;

    debug!(
        "Player {} joined queue: {}",
        payload.player_id,
        event_type.as_str()
    );
    Ok(StatusCode::OK)
}

async fn leave_queue(
    State(state): State<AppState>,
    Json(payload): Json<LeaveQueueRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .queue_service
        .leave_queue(&payload.player_id)
        .await
        .map_err(|e| {
            error!("Failed to leave queue for {}: {}", payload.player_id, e);
            ApiError::from(e)
        })?;

    debug!("Player {} left the queue", payload.player_id);
    Ok(StatusCode::OK)
}
