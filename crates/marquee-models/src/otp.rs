use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::ids::Email;

/// Persisted one-time passcode for admin login
///
/// Records are keyed by email and expire; they are deleted on successful use,
/// on detected expiry or exhaustion, and by the periodic sweeper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub id: String,
    pub email: Email,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
