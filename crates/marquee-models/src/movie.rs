use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
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
    /// Authoritative count of distinct device views
    pub views_real: u64,
    pub views_boost: u64,
    /// Score of the simulated rating bloc (0..=5)
    pub rating_boost: f64,
    /// Size of the simulated rating bloc
    pub rating_count_boost: u64,
    pub created_at: DateTime<Utc>,
}

impl Movie {
    pub fn from_draft(id: String, draft: MovieDraft, created_at: DateTime<Utc>) -> Self {
        let mut movie = Self {
            id,
            title: String::new(),
            tagline: String::new(),
            description: String::new(),
            embed_link: String::new(),
            poster_image: None,
            banner_image: None,
            genre: String::new(),
            release_date: None,
            director: String::new(),
            featured: false,
            trending: false,
            views_real: 0,
            views_boost: 0,
            rating_boost: 0.0,
            rating_count_boost: 0,
            created_at,
        };
        movie.apply_draft(draft);
        movie
    }

    /// Overwrite the editable fields; counters and boosts are left alone.
    pub fn apply_draft(&mut self, draft: MovieDraft) {
        self.title = draft.title;
        self.tagline = draft.tagline;
        self.description = draft.description;
        self.embed_link = draft.embed_link;
        self.poster_image = draft.poster_image;
        self.banner_image = draft.banner_image;
        self.genre = draft.genre;
        self.release_date = draft.release_date;
        self.director = draft.director;
        self.featured = draft.featured;
        self.trending = draft.trending;
    }

    pub fn displayed_views(&self) -> u64 {
        self.views_real.saturating_add(self.views_boost)
    }

    pub fn boosts(&self) -> Boosts {
        Boosts {
            views_boost: self.views_boost,
            rating_boost: self.rating_boost,
            rating_count_boost: self.rating_count_boost,
        }
    }

    pub fn set_boosts(&mut self, boosts: Boosts) {
        self.views_boost = boosts.views_boost;
        self.rating_boost = boosts.rating_boost;
        self.rating_count_boost = boosts.rating_count_boost;
    }

    pub fn flag(&self, flag: MovieFlag) -> bool {
        match flag {
            MovieFlag::Featured => self.featured,
            MovieFlag::Trending => self.trending,
        }
    }

    pub fn set_flag(&mut self, flag: MovieFlag, value: bool) {
        match flag {
            MovieFlag::Featured => self.featured = value,
            MovieFlag::Trending => self.trending = value,
        }
    }
}

/// Editable movie fields as submitted by the admin panel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieDraft {
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
}

/// Admin-applied display adjustments, never merged into real counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Boosts {
    pub views_boost: u64,
    pub rating_boost: f64,
    pub rating_count_boost: u64,
}

impl Boosts {
    pub fn is_zero(&self) -> bool {
        self.views_boost == 0 && self.rating_boost == 0.0 && self.rating_count_boost == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovieFlag {
    Featured,
    Trending,
}
