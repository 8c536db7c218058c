use chrono::Utc;
use marquee_models::DeviceId;
use marquee_store::{MovieStore, Store, ViewStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
    /// Whether this request counted as a new view
    pub counted: bool,
    /// Displayed view count after the request
    pub views: u64,
}

pub struct ViewService {
    store: Arc<dyn Store>,
}

impl ViewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Count the device's first view of the movie; repeats are no-ops
    pub async fn record(&self, movie_id: &str, device: &DeviceId) -> CoreResult<ViewOutcome> {
        let counted = self.store.record_view_once(movie_id, device, Utc::now()).await?;
        let movie = self
            .store
            .get_movie(movie_id)
            .await?
            .ok_or_else(|| CoreError::not_found("movie", movie_id))?;

        debug!(operation = "record_view", movie_id, counted, "View recorded");
        Ok(ViewOutcome {
            counted,
            views: movie.displayed_views(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_models::{Boosts, Movie, MovieDraft};
    use marquee_store::EmbeddedStore;

    #[tokio::test]
    async fn test_first_view_counts_once() {
        let store = Arc::new(EmbeddedStore::in_memory());
        let movie = Movie::from_draft("m1".to_string(), MovieDraft::default(), Utc::now());
        store.insert_movie(movie).await.unwrap();
        store
            .set_movie_boosts("m1", Boosts { views_boost: 100, ..Boosts::default() })
            .await
            .unwrap();

        let service = ViewService::new(store.clone());
        let device = DeviceId::parse("dev-1").unwrap();

        let first = service.record("m1", &device).await.unwrap();
        assert_eq!(first, ViewOutcome { counted: true, views: 101 });

        let second = service.record("m1", &device).await.unwrap();
        assert_eq!(second, ViewOutcome { counted: false, views: 101 });

        let movie = store.get_movie("m1").await.unwrap().unwrap();
        assert_eq!(movie.views_real, 1);
    }

    #[tokio::test]
    async fn test_unknown_movie() {
        let service = ViewService::new(Arc::new(EmbeddedStore::in_memory()));
        let result = service.record("nope", &DeviceId::parse("d").unwrap()).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
