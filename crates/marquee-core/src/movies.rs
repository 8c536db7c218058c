use chrono::{DateTime, NaiveDate, Utc};
use marquee_models::{Boosts, Movie, MovieDraft, MovieFlag};
use marquee_store::{MovieStore, RatingStore, Store};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use crate::ratings::{summarize, RatingFeed};
use crate::{CoreError, CoreResult};

pub const HOME_ROW_LIMIT: usize = 12;
const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";

/// Rewrite YouTube watch, short-link and shorts URLs to the embeddable form.
/// Anything else, including links already in embed form, is returned trimmed.
pub fn normalize_embed_link(raw: &str) -> String {
    let url = raw.trim();
    if url.is_empty() || url.contains("/embed/") {
        return url.to_string();
    }

    let video_id = if let Some((_, rest)) = url.split_once("watch?v=") {
        rest.split('&').next()
    } else if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest.split('?').next()
    } else if let Some((_, rest)) = url.split_once("/shorts/") {
        rest.split('?').next()
    } else {
        None
    };

    match video_id {
        Some(id) if !id.is_empty() => format!("{}{}", YOUTUBE_EMBED, id),
        _ => url.to_string(),
    }
}

/// Movie as shown to visitors: boosts folded into the view count, real
/// counters hidden
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicMovie {
    pub id: String,
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub embed_link: String,
    pub poster_image: Option<String>,
    pub banner_image: Option<String>,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
    pub director: String,
    pub featured: bool,
    pub trending: bool,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Movie> for PublicMovie {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id.clone(),
            title: movie.title.clone(),
            tagline: movie.tagline.clone(),
            description: movie.description.clone(),
            embed_link: movie.embed_link.clone(),
            poster_image: movie.poster_image.clone(),
            banner_image: movie.banner_image.clone(),
            genre: movie.genre.clone(),
            release_date: movie.release_date,
            director: movie.director.clone(),
            featured: movie.featured,
            trending: movie.trending,
            views: movie.displayed_views(),
            created_at: movie.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub hero: Option<PublicMovie>,
    pub trending: Vec<PublicMovie>,
    pub featured: Vec<PublicMovie>,
    pub new_releases: Vec<PublicMovie>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieAnalytics {
    pub movie_id: String,
    pub title: String,
    pub real_views: u64,
    pub displayed_views: u64,
    pub real_rating_average: f64,
    pub real_rating_count: u64,
    pub displayed_rating: f64,
    pub displayed_rating_count: u64,
    /// Real ratings per hundred real views, two decimals
    pub engagement_ratio: f64,
    pub boosts: Boosts,
}

pub fn engagement_ratio(real_rating_count: u64, views_real: u64) -> f64 {
    if views_real == 0 {
        return 0.0;
    }
    let ratio = real_rating_count as f64 / views_real as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

fn validate_boosts(boosts: &Boosts) -> CoreResult<()> {
    if !boosts.rating_boost.is_finite() || !(0.0..=5.0).contains(&boosts.rating_boost) {
        return Err(CoreError::validation("ratingBoost must be between 0 and 5"));
    }
    Ok(())
}

fn prepare_draft(mut draft: MovieDraft) -> CoreResult<MovieDraft> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(CoreError::validation("Title is required"));
    }
    draft.embed_link = normalize_embed_link(&draft.embed_link);
    Ok(draft)
}

pub struct MovieService {
    store: Arc<dyn Store>,
    feed: RatingFeed,
}

impl MovieService {
    pub fn new(store: Arc<dyn Store>, feed: RatingFeed) -> Self {
        Self { store, feed }
    }

    pub async fn create(&self, draft: MovieDraft) -> CoreResult<Movie> {
        let draft = prepare_draft(draft)?;
        let movie = Movie::from_draft(uuid::Uuid::new_v4().simple().to_string(), draft, Utc::now());
        self.store.insert_movie(movie.clone()).await?;
        info!(operation = "create_movie", movie_id = %movie.id, title = %movie.title, "Movie created");
        Ok(movie)
    }

    pub async fn update(&self, id: &str, draft: MovieDraft) -> CoreResult<Movie> {
        let draft = prepare_draft(draft)?;
        let movie = self.store.update_movie_details(id, draft).await?;
        info!(operation = "update_movie", movie_id = id, "Movie updated");
        Ok(movie)
    }

    pub async fn delete(&self, id: &str) -> CoreResult<()> {
        if !self.store.delete_movie(id).await? {
            return Err(CoreError::not_found("movie", id));
        }
        info!(operation = "delete_movie", movie_id = id, "Movie deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> CoreResult<Movie> {
        self.store
            .get_movie(id)
            .await?
            .ok_or_else(|| CoreError::not_found("movie", id))
    }

    pub async fn list(&self) -> CoreResult<Vec<Movie>> {
        Ok(self.store.list_movies().await?)
    }

    pub async fn set_flag(&self, id: &str, flag: MovieFlag, value: bool) -> CoreResult<Movie> {
        let movie = self.store.set_movie_flag(id, flag, value).await?;
        info!(operation = "set_flag", movie_id = id, flag = ?flag, value, "Movie flag set");
        Ok(movie)
    }

    pub async fn set_boosts(&self, id: &str, boosts: Boosts) -> CoreResult<Movie> {
        validate_boosts(&boosts)?;
        let movie = self.store.set_movie_boosts(id, boosts).await?;
        self.feed.publish(id);
        info!(
            operation = "set_boosts",
            movie_id = id,
            views_boost = boosts.views_boost,
            rating_boost = boosts.rating_boost,
            rating_count_boost = boosts.rating_count_boost,
            "Boosts updated"
        );
        Ok(movie)
    }

    /// Zero every boost on the movie; real counters are untouched
    pub async fn reset_boosts(&self, id: &str) -> CoreResult<Movie> {
        self.set_boosts(id, Boosts::default()).await
    }

    /// Reset boosts on every movie that has any. Returns how many were reset.
    pub async fn reset_all_boosts(&self) -> CoreResult<usize> {
        let mut reset = 0;
        for movie in self.store.list_movies().await? {
            if !movie.boosts().is_zero() {
                self.reset_boosts(&movie.id).await?;
                reset += 1;
            }
        }
        Ok(reset)
    }

    pub async fn home(&self) -> CoreResult<HomeFeed> {
        let movies = self.store.list_movies().await?;

        let pick = |pred: fn(&Movie) -> bool| -> Vec<PublicMovie> {
            movies
                .iter()
                .filter(|m| pred(m))
                .take(HOME_ROW_LIMIT)
                .map(PublicMovie::from)
                .collect()
        };
        let trending = pick(|m| m.trending);
        let featured = pick(|m| m.featured);

        let mut by_release: Vec<&Movie> = movies.iter().collect();
        // Newest release first; undated movies last
        by_release.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        let new_releases: Vec<PublicMovie> = by_release
            .into_iter()
            .take(HOME_ROW_LIMIT)
            .map(PublicMovie::from)
            .collect();

        let hero = featured
            .first()
            .or_else(|| trending.first())
            .or_else(|| new_releases.first())
            .cloned();

        Ok(HomeFeed {
            hero,
            trending,
            featured,
            new_releases,
        })
    }

    pub async fn analytics_for(&self, id: &str) -> CoreResult<MovieAnalytics> {
        let movie = self.get(id).await?;
        let ratings = self.store.ratings_for_movie(id).await?;
        Ok(analytics(&movie, &ratings))
    }

    pub async fn analytics(&self) -> CoreResult<Vec<MovieAnalytics>> {
        let mut out = Vec::new();
        for movie in self.store.list_movies().await? {
            let ratings = self.store.ratings_for_movie(&movie.id).await?;
            out.push(analytics(&movie, &ratings));
        }
        Ok(out)
    }
}

fn analytics(movie: &Movie, ratings: &[marquee_models::Rating]) -> MovieAnalytics {
    let summary = summarize(movie, ratings, None);
    MovieAnalytics {
        movie_id: movie.id.clone(),
        title: movie.title.clone(),
        real_views: movie.views_real,
        displayed_views: movie.displayed_views(),
        real_rating_average: summary.real_average,
        real_rating_count: summary.real_count,
        displayed_rating: summary.average,
        displayed_rating_count: summary.count,
        engagement_ratio: engagement_ratio(summary.real_count, movie.views_real),
        boosts: movie.boosts(),
    }
}
