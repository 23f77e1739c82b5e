use axum::{routing::get, Router};
use lambda_http::{run, tracing, Error};
use std::env::set_var;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod routes;
pub mod state;

use shared::repositories::history_repository::DynamoDbMatchHistoryRepository;
use shared::repositories::match_repository::DynamoDbMatchRepository;
use shared::repositories::player_repository::DynamoDbPlayerRatingRepository;
use shared::repositories::queue_repository::DynamoDbQueueRepository;
use shared::services::match_service::MatchService;
use shared::services::queue_service::QueueService;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    // Set up services
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);

    let queue_repository = Arc::new(DynamoDbQueueRepository::new(client.clone()));
    let match_repository = Arc::new(DynamoDbMatchRepository::new(client.clone()));
    let player_repository = Arc::new(DynamoDbPlayerRatingRepository::new(client.clone()));
    let history_repository = Arc::new(DynamoDbMatchHistoryRepository::new(client.clone()));

    let queue_service = Arc::new(QueueService::new(
        queue_repository,
        match_repository.clone(),
        player_repository.clone(),
    ));
    let match_service = Arc::new(MatchService::new(
        match_repository,
        player_repository.clone(),
        history_repository,
    ));

    let app_state = state::AppState {
        queue_service,
        match_service,
        player_repository,
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Merge routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::queue::routes())
        .merge(routes::matches::routes())
        .layer(cors)
        .with_state(app_state);

    run(app).await
}
