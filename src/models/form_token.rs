use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-use token bound to one rendered form instance of one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormToken {
    pub token: String,
    pub build_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Active,
    Consumed,
    Unknown,
}
