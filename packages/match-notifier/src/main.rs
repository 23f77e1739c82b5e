use lambda_runtime::{run, service_fn, Error};
use std::sync::Arc;
use tracing::info;

mod notifier;

use notifier::MatchNotifier;
use shared::repositories::websocket_repository::DynamoDbWebSocketRepository;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("Match notifier Lambda function starting");

    // Set up AWS configuration and notifier
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let websocket_repository = Arc::new(DynamoDbWebSocketRepository::new(client));
    let notifier = MatchNotifier::new(websocket_repository);

    // Run the Lambda function
    run(service_fn(
        move |event: lambda_runtime::LambdaEvent<aws_lambda_events::event::dynamodb::Event>| {
            let notifier = notifier.clone();
            async move { notifier.process_event(event.payload).await }
        },
    ))
    .await
}
