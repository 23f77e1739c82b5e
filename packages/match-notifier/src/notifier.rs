use std::sync::Arc;

use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use chrono::Utc;
use lambda_runtime::Error;
use serde::Serialize;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;
use tracing::{error, info, warn};

use shared::models::match_record::Match;
use shared::models::state_machine::MatchStatus;
use shared::repositories::websocket_repository::WebSocketRepository;
use shared::services::countdown_service::GameStartBroadcast;

/// Sent to both players when a match record first lands in the table.
#[derive(Debug, Serialize)]
struct MatchFoundMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    #[serde(rename = "matchId")]
    match_id: &'a str,
    #[serde(rename = "opponentId")]
    opponent_id: &'a str,
    #[serde(rename = "eventType")]
    event_type: &'a str,
}

/// Stream-triggered push notifier for the matches table. INSERTs fan
/// out a MATCH_FOUND message; MODIFYs into the countdown state fan out
/// the GAME_START broadcast with the authoritative start time.
#[derive(Clone)]
pub struct MatchNotifier {
    websocket_repository: Arc<dyn WebSocketRepository>,
}

impl MatchNotifier {
    pub fn new(websocket_repository: Arc<dyn WebSocketRepository>) -> Self {
        Self {
            websocket_repository,
        }
    }

    pub async fn process_event(&self, event: Event) -> Result<(), Error> {
        info!("Processing {} records", event.records.len());

        for record in event.records {
            if let Err(e) = self.process_record(record).await {
                error!("Failed to process record: {}", e);
            }
        }

        Ok(())
    }

    async fn process_record(
        &self,
        record: EventRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match record.event_name.as_str() {
            "INSERT" => {
                let match_record: Match = from_item(record.change.new_image.into())?;
                info!(
                    "New match {} between {} and {}",
                    match_record.match_id, match_record.player1_id, match_record.player2_id
                );
                self.notify_match_found(&match_record).await;
            }
            "MODIFY" => {
                let match_record: Match = from_item(record.change.new_image.into())?;
                let previous: Option<Match> = from_item(record.change.old_image.into()).ok();
                let was_countdown = previous
                    .map(|m| m.status == MatchStatus::Countdown)
                    .unwrap_or(false);

                if match_record.status == MatchStatus::Countdown && !was_countdown {
                    self.notify_game_start(&match_record).await;
                }
            }
            _ => {
                info!("Unhandled event type: {}", record.event_name);
            }
        }

        Ok(())
    }

    async fn notify_match_found(&self, match_record: &Match) {
        for player_id in [&match_record.player1_id, &match_record.player2_id] {
            let opponent_id = match match_record.opponent_of(player_id) {
                Some(id) => id,
                None => continue,
            };
            let message = MatchFoundMessage {
                message_type: "MATCH_FOUND",
                match_id: &match_record.match_id,
                opponent_id,
                event_type: match_record.event_type.as_str(),
            };

            match serde_json::to_string(&message) {
                Ok(payload) => self.push_to_player(player_id, &payload).await,
                Err(e) => error!("Failed to serialize MATCH_FOUND message: {}", e),
            }
        }
    }

    /// Replays the broadcast stored when the countdown was armed.
    /// `serverTime` is re-stamped at push time so the client's offset
    /// calculation reflects the delivery instant, not the arm instant.
    async fn notify_game_start(&self, match_record: &Match) {
        let game_start_time = match match_record.game_data.game_start_time {
            Some(t) => t,
            None => {
                warn!(
                    "Match {} entered countdown without a start time",
                    match_record.match_id
                );
                return;
            }
        };

        let broadcast = GameStartBroadcast {
            message_type: "GAME_START".to_string(),
            server_time: Utc::now().timestamp_millis(),
            game_start_time,
            countdown_duration: match_record.game_data.countdown_secs,
        };

        let payload = match serde_json::to_string(&broadcast) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize GAME_START broadcast: {}", e);
                return;
            }
        };

        for player_id in [&match_record.player1_id, &match_record.player2_id] {
            self.push_to_player(player_id, &payload).await;
        }
    }

    /// Disconnected players are skipped rather than failed: the
    /// disconnect policy handles them separately.
    async fn push_to_player(&self, player_id: &str, payload: &str) {
        match self.websocket_repository.get_connection_id(player_id).await {
            Ok(Some(connection_id)) => {
                if let Err(e) = self
                    .websocket_repository
                    .send_message(&connection_id, payload)
                    .await
                {
                    error!("Failed to push to player {}: {}", player_id, e);
                }
            }
            Ok(None) => {
                info!("Player {} has no active connection, skipping push", player_id);
            }
            Err(e) => {
                error!("Connection lookup failed for player {}: {}", player_id, e);
            }
        }
    }
}
