use async_trait::async_trait;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

#[cfg(test)]
use mockall::automock;

use crate::models::event_timing::EventType;
use crate::models::queue::QueueEntry;
use crate::repositories::errors::queue_repository_errors::QueueRepositoryError;

#[async_trait]
#[cfg_attr(test, automock)]
pub trait QueueRepository: Send + Sync {
    /// Inserts the entry, failing with `AlreadyExists` if the player
    /// already holds a queue entry for any event.
    async fn join_queue(&self, entry: &QueueEntry) -> Result<(), QueueRepositoryError>;

    /// Idempotent removal; deleting an absent entry is not an error.
    async fn leave_queue(&self, player_id: &str) -> Result<(), QueueRepositoryError>;

    async fn get_entry(&self, player_id: &str) -> Result<Option<QueueEntry>, QueueRepositoryError>;

    /// Queued players for `event_type` with rating in `[min_rating,
    /// max_rating]`, excluding `excluded_player_id`, ordered by earliest
    /// join time, at most `limit` entries.
    async fn find_candidates(
        &self,
        event_type: EventType,
        min_rating: i32,
        max_rating: i32,
        excluded_player_id: &str,
        limit: usize,
    ) -> Result<Vec<QueueEntry>, QueueRepositoryError>;

    /// Atomically removes both entries, claiming the pair for a new
    /// match. Both deletes are conditional on the entry still existing,
    /// so two matchers racing over the same pair cannot both win.
    /// Returns false when either side was already claimed.
    async fn claim_pair(
        &self,
        entry: &QueueEntry,
        candidate: &QueueEntry,
    ) -> Result<bool, QueueRepositoryError>;

    /// Purges entries that joined before `cutoff`. Returns how many were
    /// removed.
    async fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, QueueRepositoryError>;
}

/// Queue items are keyed by `player_id` alone, which is what makes the
/// one-entry-per-player invariant a store-level guarantee rather than an
/// API promise. Radius searches run against the `event_type-index` GSI.
pub struct DynamoDbQueueRepository {
    pub client: Client,
    pub table_name: String,
}

const EVENT_TYPE_INDEX: &str = "event_type-index";

impl DynamoDbQueueRepository {
    pub fn new(client: Client) -> Self {
        let table_name =
            std::env::var("QUEUE_TABLE").expect("QUEUE_TABLE environment variable must be set");
        Self { client, table_name }
    }
}

#[async_trait]
impl QueueRepository for DynamoDbQueueRepository {
    async fn join_queue(&self, entry: &QueueEntry) -> Result<(), QueueRepositoryError> {
        let item = to_item(entry).map_err(|e| QueueRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(player_id)")
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    QueueRepositoryError::AlreadyExists
                } else {
                    QueueRepositoryError::DynamoDb(service_error.to_string())
                }
            })?;

        Ok(())
    }

    async fn leave_queue(&self, player_id: &str) -> Result<(), QueueRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("player_id", AttributeValue::S(player_id.to_string()))
            .send()
            .await
            .map_err(|e| QueueRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn get_entry(&self, player_id: &str) -> Result<Option<QueueEntry>, QueueRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("player_id", AttributeValue::S(player_id.to_string()))
            .send()
            .await
            .map_err(|e| QueueRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let entry: QueueEntry = from_item(item)
                    .map_err(|e| QueueRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn find_candidates(
        &self,
        event_type: EventType,
        min_rating: i32,
        max_rating: i32,
        excluded_player_id: &str,
        limit: usize,
    ) -> Result<Vec<QueueEntry>, QueueRepositoryError> {
        let query_result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(EVENT_TYPE_INDEX)
            .key_condition_expression("event_type = :event_type")
            .filter_expression("rating BETWEEN :min AND :max AND player_id <> :me")
            .expression_attribute_values(
                ":event_type",
                AttributeValue::S(event_type.as_str().to_string()),
            )
            .expression_attribute_values(":min", AttributeValue::N(min_rating.to_string()))
            .expression_attribute_values(":max", AttributeValue::N(max_rating.to_string()))
            .expression_attribute_values(":me", AttributeValue::S(excluded_player_id.to_string()))
            .send()
            .await
            .map_err(|e| QueueRepositoryError::DynamoDb(e.to_string()))?;

        let mut candidates = Vec::new();
        if let Some(items) = query_result.items {
            for item in items {
                let entry: QueueEntry = from_item(item)
                    .map_err(|e| QueueRepositoryError::Serialization(e.to_string()))?;
                candidates.push(entry);
            }
        }

        // Earliest joiners first, then cap the candidate set.
        candidates.sort_by_key(|entry| entry.joined_at);
        candidates.truncate(limit);

        Ok(candidates)
    }

    async fn claim_pair(
        &self,
        entry: &QueueEntry,
        candidate: &QueueEntry,
    ) -> Result<bool, QueueRepositoryError> {
        let mut transaction_items = Vec::new();
        for queued in [entry, candidate] {
            let delete = Delete::builder()
                .table_name(&self.table_name)
                .key("player_id", AttributeValue::S(queued.player_id.clone()))
                .condition_expression("attribute_exists(player_id)")
                .build()
                .map_err(|e| QueueRepositoryError::DynamoDb(e.to_string()))?;
            transaction_items.push(TransactWriteItem::builder().delete(delete).build());
        }

        match self
            .client
            .transact_write_items()
            .set_transact_items(Some(transaction_items))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if let TransactWriteItemsError::TransactionCanceledException(cancelled) =
                    &service_error
                {
                    let lost_race = cancelled
                        .cancellation_reasons()
                        .iter()
                        .any(|reason| reason.code() == Some("ConditionalCheckFailed"));
                    if lost_race {
                        // Another matcher already took one of the entries.
                        return Ok(false);
                    }
                }
                Err(QueueRepositoryError::DynamoDb(service_error.to_string()))
            }
        }
    }

    async fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, QueueRepositoryError> {
        // joined_at is stored as epoch seconds, so the comparison is
        // numeric rather than lexicographic.
        let scan_result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("joined_at < :cutoff")
            .expression_attribute_values(
                ":cutoff",
                AttributeValue::N(cutoff.timestamp().to_string()),
            )
            .send()
            .await
            .map_err(|e| QueueRepositoryError::DynamoDb(e.to_string()))?;

        let mut removed = 0;
        if let Some(items) = scan_result.items {
            for item in items {
                let entry: QueueEntry = from_item(item)
                    .map_err(|e| QueueRepositoryError::Serialization(e.to_string()))?;
                self.leave_queue(&entry.player_id).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
