use std::sync::Arc;

use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::Error;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;
use tracing::{error, info, warn};

use shared::models::queue::QueueEntry;
use shared::repositories::match_repository::DynamoDbMatchRepository;
use shared::repositories::player_repository::DynamoDbPlayerRatingRepository;
use shared::repositories::queue_repository::DynamoDbQueueRepository;
use shared::services::queue_service::QueueService;

/// Stream-triggered matcher: every queue INSERT kicks off one search
/// pass for the new entry. Entries that find no opponent stay queued
/// and get another chance when the next player joins.
#[derive(Clone)]
pub struct MatchmakingProcessor {
    queue_service: QueueService,
}

impl MatchmakingProcessor {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        let queue_repository = Arc::new(DynamoDbQueueRepository::new(client.clone()));
        let match_repository = Arc::new(DynamoDbMatchRepository::new(client.clone()));
        let player_repository = Arc::new(DynamoDbPlayerRatingRepository::new(client));

        let queue_service =
            QueueService::new(queue_repository, match_repository, player_repository);

        Self { queue_service }
    }

    pub async fn process_event(&self, event: Event) -> Result<(), Error> {
        // The stream mapping is configured with a batch size of one.
        if event.records.len() != 1 {
            warn!(
                "Stream batch carried {} records instead of 1, handling only the first",
                event.records.len()
            );
        }

        if let Some(record) = event.records.into_iter().next() {
            let event_name = record.event_name.as_str();

            match event_name {
                "INSERT" => {
                    let new_image = record.change.new_image;
                    let entry: QueueEntry = from_item(new_image.into())?;

                    info!(
                        "Processing new queue entry: {} ({} at {})",
                        entry.player_id,
                        entry.event_type.as_str(),
                        entry.rating
                    );

                    if let Err(e) = self.process_new_entry(&entry).await {
                        error!(
                            "Failed to process queue entry for {}: {}",
                            entry.player_id, e
                        );
                    }
                }
                "REMOVE" => {
                    let old_image = record.change.old_image;
                    if let Ok(entry) = from_item::<QueueEntry>(old_image.into()) {
                        info!("Player {} left the matchmaking queue", entry.player_id);
                    }
                }
                _ => {
                    warn!("Unhandled event type: {}", event_name);
                }
            }
        }

        Ok(())
    }

    async fn process_new_entry(&self, entry: &QueueEntry) -> Result<(), Error> {
        match self.queue_service.find_match(entry).await {
            Ok(Some(match_record)) => {
                info!(
                    "Matched {} with {} in match {}",
                    match_record.player1_id, match_record.player2_id, match_record.match_id
                );
            }
            Ok(None) => {
                info!(
                    "No suitable opponent found for {}. Entry remains queued.",
                    entry.player_id
                );
            }
            Err(e) => {
                error!("Matchmaking error for {}: {}", entry.player_id, e);
            }
        }

        Ok(())
    }
}
