use chrono::Utc;
use futures::stream::{self, Stream};
use marquee_models::{DeviceId, Movie, Rating, RatingSummary, Stars};
use marquee_store::{MovieStore, RatingStore, Store, UpsertOutcome};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use crate::{CoreError, CoreResult};

const FEED_CAPACITY: usize = 256;

/// Boosted average shown to visitors.
///
/// Weighted mean of the real ratings and a simulated bloc of
/// `boost_count` ratings of `boost` stars, clamped to [0, 5] and rounded to
/// one decimal. Zero when there is nothing to average.
pub fn display_average(real_average: f64, real_count: u64, boost: f64, boost_count: u64) -> f64 {
    let denominator = real_count + boost_count;
    if denominator == 0 {
        return 0.0;
    }
    let total = real_average * real_count as f64 + boost * boost_count as f64;
    let average = (total / denominator as f64).clamp(0.0, 5.0);
    (average * 10.0).round() / 10.0
}

pub fn summarize(movie: &Movie, ratings: &[Rating], device: Option<&DeviceId>) -> RatingSummary {
    let real_count = ratings.len() as u64;
    let real_average = if real_count == 0 {
        0.0
    } else {
        ratings.iter().map(|r| r.rating.get() as f64).sum::<f64>() / real_count as f64
    };

    let device_rating = device.and_then(|d| {
        ratings
            .iter()
            .find(|r| &r.device_id == d)
            .map(|r| r.rating.get())
    });

    RatingSummary {
        movie_id: movie.id.clone(),
        real_average,
        real_count,
        average: display_average(
            real_average,
            real_count,
            movie.rating_boost,
            movie.rating_count_boost,
        ),
        count: real_count + movie.rating_count_boost,
        device_rating,
    }
}

/// Notification that a movie's rating summary may have changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingChange {
    pub movie_id: String,
}

/// Fan-out of rating changes to live subscribers
#[derive(Clone)]
pub struct RatingFeed {
    sender: broadcast::Sender<RatingChange>,
}

impl RatingFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, movie_id: &str) {
        // No receivers is fine: nobody is watching this movie
        let _ = self.sender.send(RatingChange {
            movie_id: movie_id.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RatingChange> {
        self.sender.subscribe()
    }
}

impl Default for RatingFeed {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RatingService {
    store: Arc<dyn Store>,
    feed: RatingFeed,
}

impl RatingService {
    pub fn new(store: Arc<dyn Store>, feed: RatingFeed) -> Self {
        Self { store, feed }
    }

    pub fn feed(&self) -> &RatingFeed {
        &self.feed
    }

    pub async fn summary(&self, movie_id: &str, device: Option<&DeviceId>) -> CoreResult<RatingSummary> {
        let movie = self
            .store
            .get_movie(movie_id)
            .await?
            .ok_or_else(|| CoreError::not_found("movie", movie_id))?;
        let ratings = self.store.ratings_for_movie(movie_id).await?;
        Ok(summarize(&movie, &ratings, device))
    }

    /// Record the device's rating (insert or overwrite) and return the new summary
    pub async fn rate(&self, movie_id: &str, device: &DeviceId, stars: Stars) -> CoreResult<RatingSummary> {
        let outcome = self
            .store
            .upsert_rating(movie_id, device, stars, Utc::now())
            .await?;
        match outcome {
            UpsertOutcome::Inserted => {
                info!(operation = "rate", movie_id, stars = stars.get(), "Rating added")
            }
            UpsertOutcome::Updated => {
                debug!(operation = "rate", movie_id, stars = stars.get(), "Rating updated")
            }
        }
        self.feed.publish(movie_id);
        self.summary(movie_id, Some(device)).await
    }

    /// Current summary followed by a fresh one after every change to the movie
    pub fn watch(
        self: Arc<Self>,
        movie_id: String,
        device: Option<DeviceId>,
    ) -> impl Stream<Item = CoreResult<RatingSummary>> + Send + 'static {
        let receiver = self.feed.subscribe();
        stream::unfold(
            (self, receiver, movie_id, device, true),
            |(service, mut receiver, movie_id, device, first)| async move {
                if !first {
                    loop {
                        match receiver.recv().await {
                            Ok(change) if change.movie_id == movie_id => break,
                            Ok(_) => continue,
                            // Missed notifications collapse into one refresh
                            Err(broadcast::error::RecvError::Lagged(_)) => break,
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                }
                let summary = service.summary(&movie_id, device.as_ref()).await;
                Some((summary, (service, receiver, movie_id, device, false)))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use marquee_models::MovieDraft;
    use marquee_store::EmbeddedStore;

    fn device(raw: &str) -> DeviceId {
        DeviceId::parse(raw).unwrap()
    }

    async fn service_with_movie() -> Arc<RatingService> {
        let store = Arc::new(EmbeddedStore::in_memory());
        let movie = Movie::from_draft("m1".to_string(), MovieDraft::default(), Utc::now());
        store.insert_movie(movie).await.unwrap();
        Arc::new(RatingService::new(store, RatingFeed::new()))
    }

    #[test]
    fn test_display_average_with_boost() {
        assert_eq!(display_average(4.0, 10, 5.0, 5), 4.3);
        assert_eq!(display_average(0.0, 0, 0.0, 0), 0.0);
        assert_eq!(display_average(0.0, 0, 4.5, 2), 4.5);
        assert_eq!(display_average(3.0, 2, 0.0, 0), 3.0);
    }

    #[test]
    fn test_display_average_is_clamped() {
        assert_eq!(display_average(5.0, 1, 9.0, 10), 5.0);
        assert_eq!(display_average(1.0, 1, -3.0, 10), 0.0);
    }

    #[tokio::test]
    async fn test_rate_overwrites_device_rating() {
        let service = service_with_movie().await;
        let d = device("dev-1");

        service.rate("m1", &d, Stars::new(2).unwrap()).await.unwrap();
        let summary = service.rate("m1", &d, Stars::new(4).unwrap()).await.unwrap();

        assert_eq!(summary.real_count, 1);
        assert_eq!(summary.real_average, 4.0);
        assert_eq!(summary.device_rating, Some(4));

        let other = service.summary("m1", Some(&device("dev-2"))).await.unwrap();
        assert_eq!(other.device_rating, None);
    }

    #[tokio::test]
    async fn test_unknown_movie() {
        let service = service_with_movie().await;
        let result = service.summary("nope", None).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_watch_emits_on_change() {
        let service = service_with_movie().await;
        let mut updates = Box::pin(service.clone().watch("m1".to_string(), None));

        let initial = updates.next().await.unwrap().unwrap();
        assert_eq!(initial.count, 0);

        service.rate("m1", &device("dev-1"), Stars::new(5).unwrap()).await.unwrap();
        let next = updates.next().await.unwrap().unwrap();
        assert_eq!(next.count, 1);
        assert_eq!(next.average, 5.0);
    }
}
