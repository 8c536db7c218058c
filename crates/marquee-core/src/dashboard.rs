use marquee_store::{CommentStore, MovieStore, PremiereStore, RatingStore, Store};
use serde::Serialize;
use crate::CoreResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub movies: u64,
    pub ratings: u64,
    pub comments: u64,
    pub premieres: u64,
    pub real_views: u64,
    pub displayed_views: u64,
}

pub async fn dashboard(store: &dyn Store) -> CoreResult<DashboardStats> {
    let movies = store.list_movies().await?;
    Ok(DashboardStats {
        movies: movies.len() as u64,
        ratings: store.count_ratings().await?,
        comments: store.count_comments().await?,
        premieres: store.list_premieres().await?.len() as u64,
        real_views: movies.iter().map(|m| m.views_real).sum(),
        displayed_views: movies.iter().map(|m| m.displayed_views()).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use marquee_models::{Boosts, DeviceId, Movie, MovieDraft, Stars};
    use marquee_store::{EmbeddedStore, ViewStore};

    #[tokio::test]
    async fn test_totals() {
        let store = EmbeddedStore::in_memory();
        for id in ["m1", "m2"] {
            let movie = Movie::from_draft(id.to_string(), MovieDraft::default(), Utc::now());
            store.insert_movie(movie).await.unwrap();
        }
        let device = DeviceId::parse("d1").unwrap();
        store.record_view_once("m1", &device, Utc::now()).await.unwrap();
        store
            .upsert_rating("m2", &device, Stars::new(3).unwrap(), Utc::now())
            .await
            .unwrap();
        store
            .set_movie_boosts("m2", Boosts { views_boost: 10, ..Boosts::default() })
            .await
            .unwrap();

        let stats = dashboard(&store).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                movies: 2,
                ratings: 1,
                comments: 0,
                premieres: 0,
                real_views: 1,
                displayed_views: 11,
            }
        );
    }
}
