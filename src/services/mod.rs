pub mod message_service;
pub mod render_service;
pub mod scoring_service;
pub mod submission_service;
