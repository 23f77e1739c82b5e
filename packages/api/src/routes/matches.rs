use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error};

use crate::{error::ApiError, state::AppState};
use shared::models::match_api::SubmitAnswersRequest;
use shared::models::match_record::Match;
use shared::services::countdown_service::GameStartBroadcast;
use shared::services::scoring_service::ScoringResult;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/{match_id}", get(get_match))
        .route("/matches/{match_id}/start", post(start_match))
        .route("/matches/{match_id}/answers", post(submit_answers))
}

/// Arms the countdown once both players have connected. The broadcast
/// carries the server clock alongside the start time so clients can
/// correct for their own clock skew.
async fn start_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<GameStartBroadcast>, ApiError> {
    let (match_record, broadcast) =
        state.match_service.start_countdown(&match_id).await.map_err(|e| {
            error!("Failed to start countdown for match {}: {}", match_id, e);
            ApiError::from(e)
        })?;

    debug!(
        "Countdown armed for match {}: game starts at {}",
        match_record.match_id, broadcast.game_start_time
    );
    Ok(Json(broadcast))
}

async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Match>, ApiError> {
    let match_record = state.match_service.get_match(&match_id).await.map_err(|e| {
        error!("Failed to load match {}: {}", match_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(match_record))
}

async fn submit_answers(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<Json<ScoringResult>, ApiError> {
    let (_, result) = state
        .match_service
        .submit_answers(&match_id, &payload.player_id, &payload.recalled)
        .await
        .map_err(|e| {
            error!(
                "Answer submission failed for {} in match {}: {}",
                payload.player_id, match_id, e
            );
            ApiError::from(e)
        })?;

    debug!(
        "Player {} submitted answers for match {}: {} points",
        payload.player_id, match_id, result.total_score
    );
    Ok(Json(result))
}
