use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

#[cfg(test)]
use mockall::automock;

use crate::models::player::PlayerRating;
use crate::repositories::errors::player_repository_errors::PlayerRepositoryError;

#[async_trait]
#[cfg_attr(test, automock)]
pub trait PlayerRatingRepository: Send + Sync {
    async fn get_player(&self, player_id: &str)
        -> Result<PlayerRating, PlayerRepositoryError>;

    async fn put_player(&self, player: &PlayerRating) -> Result<(), PlayerRepositoryError>;
}

pub struct DynamoDbPlayerRatingRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbPlayerRatingRepository {
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var("PLAYERS_TABLE")
            .expect("PLAYERS_TABLE environment variable must be set");
        Self { client, table_name }
    }
}

#[async_trait]
impl PlayerRatingRepository for DynamoDbPlayerRatingRepository {
    async fn get_player(
        &self,
        player_id: &str,
    ) -> Result<PlayerRating, PlayerRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("player_id", AttributeValue::S(player_id.to_string()))
            .send()
            .await
            .map_err(|e| PlayerRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let player: PlayerRating = from_item(item)
                    .map_err(|e| PlayerRepositoryError::Serialization(e.to_string()))?;
                Ok(player)
            }
            None => Err(PlayerRepositoryError::NotFound),
        }
    }

    async fn put_player(&self, player: &PlayerRating) -> Result<(), PlayerRepositoryError> {
        let item =
            to_item(player).map_err(|e| PlayerRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| PlayerRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }
}
