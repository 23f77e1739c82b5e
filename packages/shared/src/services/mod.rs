pub mod countdown_service;
pub mod errors;
pub mod match_service;
pub mod queue_service;
pub mod rating_service;
pub mod scoring_service;
