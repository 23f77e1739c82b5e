use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

#[cfg(test)]
use mockall::automock;

use crate::models::match_record::Match;
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;

#[async_trait]
#[cfg_attr(test, automock)]
pub trait MatchRepository: Send + Sync {
    async fn create_match(&self, match_record: &Match) -> Result<(), MatchRepositoryError>;

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError>;

    /// Full-record write, guarded so a match cannot be resurrected after
    /// deletion.
    async fn update_match(&self, match_record: &Match) -> Result<(), MatchRepositoryError>;
}

pub struct DynamoDbMatchRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbMatchRepository {
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var("MATCHES_TABLE")
            .expect("MATCHES_TABLE environment variable must be set");
        Self { client, table_name }
    }
}

#[async_trait]
impl MatchRepository for DynamoDbMatchRepository {
    async fn create_match(&self, match_record: &Match) -> Result<(), MatchRepositoryError> {
        let item =
            to_item(match_record).map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(match_id)")
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    MatchRepositoryError::AlreadyExists
                } else {
                    MatchRepositoryError::DynamoDb(service_error.to_string())
                }
            })?;

        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("match_id", AttributeValue::S(match_id.to_string()))
            .send()
            .await
            .map_err(|e| MatchRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let match_record: Match = from_item(item)
                    .map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(match_record))
            }
            None => Ok(None),
        }
    }

    async fn update_match(&self, match_record: &Match) -> Result<(), MatchRepositoryError> {
        let item =
            to_item(match_record).map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(match_id)")
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    MatchRepositoryError::NotFound
                } else {
                    MatchRepositoryError::DynamoDb(service_error.to_string())
                }
            })?;

        Ok(())
    }
}
