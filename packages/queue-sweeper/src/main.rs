use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

use shared::{
    repositories::{
        match_repository::DynamoDbMatchRepository, player_repository::DynamoDbPlayerRatingRepository,
        queue_repository::DynamoDbQueueRepository,
    },
    services::queue_service::QueueService,
};

/// Scheduled sweep that evicts abandoned queue entries. Players whose
/// clients crashed without sending a leave request would otherwise sit
/// in the pool forever and get matched against nobody.
#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("Queue sweeper Lambda function starting");

    // Set up AWS configuration and services
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);

    let queue_repository = Arc::new(DynamoDbQueueRepository::new(client.clone()));
    let match_repository = Arc::new(DynamoDbMatchRepository::new(client.clone()));
    let player_repository = Arc::new(DynamoDbPlayerRatingRepository::new(client));
    let queue_service = QueueService::new(queue_repository, match_repository, player_repository);

    // Run the Lambda function on the EventBridge schedule
    run(service_fn(
        move |_event: LambdaEvent<serde_json::Value>| {
            let queue_service = queue_service.clone();
            async move {
                let removed = queue_service.clean_stale_entries().await?;
                info!("Swept {} stale queue entries", removed);
                Ok::<(), Error>(())
            }
        },
    ))
    .await
}
