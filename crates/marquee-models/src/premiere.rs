use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduled, ticketed live-viewing event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Premiere {
    pub id: String,
    pub title: String,
    pub description: String,
    pub movie_id: String,
    pub director_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub policy: TicketPolicy,
    pub max_seats: Option<u32>,
    pub requires_ticket: bool,
    pub transferable: bool,
    pub payment: PaymentConfig,
    pub embed_link: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Premiere {
    pub fn from_draft(
        id: String,
        draft: PremiereDraft,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            movie_id: draft.movie_id,
            director_id: draft.director_id,
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
            policy: draft.policy,
            max_seats: draft.max_seats,
            requires_ticket: draft.requires_ticket,
            transferable: draft.transferable,
            payment: draft.payment,
            embed_link: draft.embed_link,
            created_by,
            created_at,
        }
    }

    /// Status within the schedule window; the start instant counts as live
    /// and the end instant as ended.
    pub fn status_at(&self, now: DateTime<Utc>) -> PremiereStatus {
        if now < self.starts_at {
            PremiereStatus::Upcoming
        } else if now < self.ends_at {
            PremiereStatus::Live
        } else {
            PremiereStatus::Ended
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PremiereDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub movie_id: String,
    #[serde(default)]
    pub director_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub policy: TicketPolicy,
    #[serde(default)]
    pub max_seats: Option<u32>,
    #[serde(default)]
    pub requires_ticket: bool,
    #[serde(default)]
    pub transferable: bool,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub embed_link: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketPolicy {
    #[default]
    Free,
    Limited,
    Paid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PremiereStatus {
    Upcoming,
    Live,
    Ended,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentConfig {
    pub enabled: bool,
    pub kind: PaymentKind,
    pub upi_id: Option<String>,
    pub link: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    #[default]
    None,
    Upi,
    Qr,
    Link,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_follows_schedule_window() {
        let start = Utc::now();
        let draft = PremiereDraft {
            title: "Opening night".to_string(),
            description: String::new(),
            movie_id: "m1".to_string(),
            director_id: None,
            starts_at: start,
            ends_at: start + Duration::hours(2),
            policy: TicketPolicy::Free,
            max_seats: None,
            requires_ticket: false,
            transferable: false,
            payment: PaymentConfig::default(),
            embed_link: None,
        };
        let premiere = Premiere::from_draft("p1".to_string(), draft, "admin".to_string(), start);

        assert_eq!(premiere.status_at(start - Duration::minutes(1)), PremiereStatus::Upcoming);
        assert_eq!(premiere.status_at(start), PremiereStatus::Live);
        assert_eq!(premiere.status_at(start + Duration::hours(2)), PremiereStatus::Ended);
    }

    #[test]
    fn test_draft_defaults() {
        let draft: PremiereDraft = serde_json::from_str(
            r#"{"title":"T","movieId":"m","startsAt":"2026-01-01T18:00:00Z","endsAt":"2026-01-01T20:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(draft.policy, TicketPolicy::Free);
        assert_eq!(draft.payment.kind, PaymentKind::None);
        assert!(draft.max_seats.is_none());
    }
}
