use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::ids::DeviceId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub movie_id: String,
    pub device_id: DeviceId,
    pub created_at: DateTime<Utc>,
}
