use chrono::Utc;
use marquee_models::WishlistItem;
use marquee_store::{MovieStore, Store, WishlistStore};
use std::sync::Arc;
use tracing::debug;
use crate::{CoreError, CoreResult};

fn user(user_id: &str) -> CoreResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(CoreError::validation("userId required"));
    }
    Ok(user_id)
}

pub struct WishlistService {
    store: Arc<dyn Store>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add the movie, snapshotting its title and poster. Adding twice is a no-op.
    pub async fn add(&self, user_id: &str, movie_id: &str) -> CoreResult<WishlistItem> {
        let user_id = user(user_id)?;
        let movie = self
            .store
            .get_movie(movie_id)
            .await?
            .ok_or_else(|| CoreError::not_found("movie", movie_id))?;

        let item = WishlistItem {
            user_id: user_id.to_string(),
            movie_id: movie.id,
            title: movie.title,
            poster_image: movie.poster_image,
            added_at: Utc::now(),
        };
        let added = self.store.add_to_wishlist(item.clone()).await?;
        debug!(operation = "wishlist_add", user_id, movie_id, added, "Wishlist updated");
        Ok(item)
    }

    pub async fn remove(&self, user_id: &str, movie_id: &str) -> CoreResult<bool> {
        let user_id = user(user_id)?;
        let removed = self.store.remove_from_wishlist(user_id, movie_id).await?;
        debug!(operation = "wishlist_remove", user_id, movie_id, removed, "Wishlist updated");
        Ok(removed)
    }

    /// Flip membership; returns whether the movie is on the list afterwards
    pub async fn toggle(&self, user_id: &str, movie_id: &str) -> CoreResult<bool> {
        if self.remove(user_id, movie_id).await? {
            return Ok(false);
        }
        self.add(user_id, movie_id).await?;
        Ok(true)
    }

    pub async fn contains(&self, user_id: &str, movie_id: &str) -> CoreResult<bool> {
        let user_id = user(user_id)?;
        Ok(self.store.wishlist_contains(user_id, movie_id).await?)
    }

    pub async fn list(&self, user_id: &str) -> CoreResult<Vec<WishlistItem>> {
        let user_id = user(user_id)?;
        Ok(self.store.wishlist_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_models::{Movie, MovieDraft};
    use marquee_store::EmbeddedStore;

    #[tokio::test]
    async fn test_toggle_and_list() {
        let store = Arc::new(EmbeddedStore::in_memory());
        let movie = Movie::from_draft(
            "m1".to_string(),
            MovieDraft {
                title: "Dune".to_string(),
                poster_image: Some("https://img/dune.jpg".to_string()),
                ..MovieDraft::default()
            },
            Utc::now(),
        );
        store.insert_movie(movie).await.unwrap();
        let service = WishlistService::new(store);

        assert!(service.toggle("u1", "m1").await.unwrap());
        assert!(service.contains("u1", "m1").await.unwrap());
        assert!(!service.contains("u2", "m1").await.unwrap());

        let items = service.list("u1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Dune");

        assert!(!service.toggle("u1", "m1").await.unwrap());
        assert!(service.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requires_user_and_movie() {
        let service = WishlistService::new(Arc::new(EmbeddedStore::in_memory()));
        assert!(matches!(service.add(" ", "m1").await, Err(CoreError::Validation(_))));
        assert!(matches!(service.add("u1", "m1").await, Err(CoreError::NotFound { .. })));
    }
}
