pub mod match_service_errors;
pub mod queue_service_errors;
