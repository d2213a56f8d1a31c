//! Event and event-day models touched by tour transitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One scheduled day of the running tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDay {
    pub id: i64,
    pub label: String,
    pub date: NaiveDate,
}

/// An archived event that `open()` will purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    pub id: i64,
    pub image_url: Option<String>,
}
