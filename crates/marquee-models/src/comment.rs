use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub movie_id: String,
    pub author: CommentAuthor,
    pub text: String,
    pub is_admin: bool,
    /// Top-level comment this replies to; replies are never parents
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentAuthor {
    pub user_id: Option<String>,
    pub name: String,
    pub photo_url: Option<String>,
}

/// A top-level comment with its replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}
