use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::to_item;

#[cfg(test)]
use mockall::automock;

use crate::models::match_history::MatchHistoryEntry;
use crate::repositories::errors::history_repository_errors::HistoryRepositoryError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MatchHistoryRepository: Send + Sync {
    /// Appends one immutable per-player history row.
    async fn record(&self, entry: &MatchHistoryEntry) -> Result<(), HistoryRepositoryError>;
}

pub struct DynamoDbMatchHistoryRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbMatchHistoryRepository {
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var("MATCH_HISTORY_TABLE")
            .expect("MATCH_HISTORY_TABLE environment variable must be set");
        Self { client, table_name }
    }
}

#[async_trait]
impl MatchHistoryRepository for DynamoDbMatchHistoryRepository {
    async fn record(&self, entry: &MatchHistoryEntry) -> Result<(), HistoryRepositoryError> {
        let item =
            to_item(entry).map_err(|e| HistoryRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| HistoryRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }
}
