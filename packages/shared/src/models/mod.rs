pub mod event_timing;
pub mod match_api;
pub mod match_history;
pub mod match_record;
pub mod player;
pub mod queue;
pub mod state_machine;
