use std::sync::Arc;

use shared::repositories::player_repository::PlayerRatingRepository;
use shared::services::match_service::MatchService;
use shared::services::queue_service::QueueService;

#[derive(Clone)]
pub struct AppState {
    pub queue_service: Arc<QueueService>,
    pub match_service: Arc<MatchService>,
    pub player_repository: Arc<dyn PlayerRatingRepository>,
}
