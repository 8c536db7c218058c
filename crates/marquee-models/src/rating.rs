use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::ids::{DeviceId, Stars};

/// One device's rating of one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub movie_id: String,
    pub device_id: DeviceId,
    pub rating: Stars,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregated rating view of a movie, as shown to visitors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub movie_id: String,
    pub real_average: f64,
    pub real_count: u64,
    /// Boosted average, clamped to [0, 5] and rounded to one decimal
    pub average: f64,
    pub count: u64,
    /// The requesting device's own rating, if any
    pub device_rating: Option<u8>,
}
