use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::ids::TicketCode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub premiere_id: String,
    pub code: TicketCode,
    pub used: bool,
    pub used_by: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(premiere_id: String, code: TicketCode, created_at: DateTime<Utc>) -> Self {
        Self {
            premiere_id,
            code,
            used: false,
            used_by: None,
            used_at: None,
            created_at,
        }
    }
}

/// Shape of generated ticket codes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketFormat {
    /// `AB3F-92K1`: two base36 groups of four
    #[default]
    Grouped,
    /// `CHK-A8F9B2`: three random bytes in hex
    Hex,
}
