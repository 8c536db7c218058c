use chrono::{DateTime, Utc};
use marquee_models::{PaymentKind, Premiere, PremiereDraft, PremiereStatus, TicketPolicy};
use marquee_store::{MovieStore, PremiereStore, Store};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use crate::movies::normalize_embed_link;
use crate::{CoreError, CoreResult};

/// Premiere with its status at the time of the request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiereView {
    #[serde(flatten)]
    pub premiere: Premiere,
    pub status: PremiereStatus,
}

impl PremiereView {
    pub fn at(premiere: Premiere, now: DateTime<Utc>) -> Self {
        let status = premiere.status_at(now);
        Self { premiere, status }
    }
}

fn validate(draft: &mut PremiereDraft) -> CoreResult<()> {
    draft.title = draft.title.trim().to_string();
    draft.movie_id = draft.movie_id.trim().to_string();
    if draft.title.is_empty() {
        return Err(CoreError::validation("Title is required"));
    }
    if draft.movie_id.is_empty() {
        return Err(CoreError::validation("movieId is required"));
    }
    if draft.ends_at <= draft.starts_at {
        return Err(CoreError::validation("End time must be after start time"));
    }

    match draft.policy {
        TicketPolicy::Limited if !matches!(draft.max_seats, Some(n) if n > 0) => {
            return Err(CoreError::validation("Limited premieres need maxSeats greater than 0"));
        }
        TicketPolicy::Paid if !draft.payment.enabled || draft.payment.kind == PaymentKind::None => {
            return Err(CoreError::validation("Paid premieres need a payment method"));
        }
        _ => {}
    }

    if draft.payment.enabled {
        match draft.payment.kind {
            PaymentKind::Upi if draft.payment.upi_id.as_deref().map_or(true, |s| s.trim().is_empty()) => {
                return Err(CoreError::validation("UPI payments need a upiId"));
            }
            PaymentKind::Link if draft.payment.link.as_deref().map_or(true, |s| s.trim().is_empty()) => {
                return Err(CoreError::validation("Link payments need a payment link"));
            }
            _ => {}
        }
    }
    if let Some(price) = draft.payment.price {
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::validation("price must be a non-negative number"));
        }
    }

    draft.embed_link = draft
        .embed_link
        .take()
        .map(|link| normalize_embed_link(&link))
        .filter(|link| !link.is_empty());
    Ok(())
}

pub struct PremiereService {
    store: Arc<dyn Store>,
}

impl PremiereService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut draft: PremiereDraft, created_by: &str) -> CoreResult<Premiere> {
        validate(&mut draft)?;
        if self.store.get_movie(&draft.movie_id).await?.is_none() {
            return Err(CoreError::validation("movieId does not match a movie"));
        }

        let premiere = Premiere::from_draft(
            uuid::Uuid::new_v4().simple().to_string(),
            draft,
            created_by.to_string(),
            Utc::now(),
        );
        self.store.insert_premiere(premiere.clone()).await?;
        info!(
            operation = "create_premiere",
            premiere_id = %premiere.id,
            policy = ?premiere.policy,
            created_by,
            "Premiere created"
        );
        Ok(premiere)
    }

    pub async fn get(&self, id: &str) -> CoreResult<PremiereView> {
        let premiere = self
            .store
            .get_premiere(id)
            .await?
            .ok_or_else(|| CoreError::not_found("premiere", id))?;
        Ok(PremiereView::at(premiere, Utc::now()))
    }

    /// Newest first
    pub async fn list(&self) -> CoreResult<Vec<PremiereView>> {
        let now = Utc::now();
        Ok(self
            .store
            .list_premieres()
            .await?
            .into_iter()
            .map(|p| PremiereView::at(p, now))
            .collect())
    }
}
