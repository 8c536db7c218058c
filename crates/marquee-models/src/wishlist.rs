use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub user_id: String,
    pub movie_id: String,
    pub title: String,
    pub poster_image: Option<String>,
    pub added_at: DateTime<Utc>,
}
