use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_models::{
    Boosts, Comment, DeviceId, Email, Movie, MovieDraft, MovieFlag, OtpRecord, Premiere, Rating,
    Stars, Ticket, TicketCode, View, WishlistItem,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info};
use crate::snapshot::SnapshotFile;
use crate::traits::{
    CommentStore, MovieStore, OtpStore, PremiereStore, RatingStore, RedeemOutcome, StoreResult,
    TicketStore, UpsertOutcome, ViewStore, WishlistStore,
};
use crate::StoreError;

type PairKey = (String, String);

fn pair(a: &str, b: &str) -> PairKey {
    (a.to_string(), b.to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collections {
    movies: HashMap<String, Movie>,
    /// (movie_id, device_id)
    ratings: HashMap<PairKey, Rating>,
    /// (movie_id, device_id)
    views: HashMap<PairKey, View>,
    comments: HashMap<String, Comment>,
    otps: HashMap<String, OtpRecord>,
    premieres: HashMap<String, Premiere>,
    /// (premiere_id, code)
    tickets: HashMap<PairKey, Ticket>,
    /// (user_id, movie_id)
    wishlist: HashMap<PairKey, WishlistItem>,
}

impl Collections {
    fn movie_mut(&mut self, id: &str) -> StoreResult<&mut Movie> {
        self.movies
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("movie", id))
    }
}

/// In-process document store
///
/// All collections sit behind one `RwLock`; every write takes the write
/// half, so each conditional write is atomic with respect to all others.
/// With a snapshot file configured, the whole image is persisted after each
/// write that changed something.
pub struct EmbeddedStore {
    state: RwLock<Collections>,
    snapshot: Option<SnapshotFile>,
}

impl EmbeddedStore {
    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Collections::default()),
            snapshot: None,
        }
    }

    /// Store restored from (and persisted to) `path`
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        let snapshot = SnapshotFile::new(path);
        let collections: Collections = snapshot.load()?.unwrap_or_default();
        info!(
            path = %snapshot.path().display(),
            movies = collections.movies.len(),
            ratings = collections.ratings.len(),
            comments = collections.comments.len(),
            premieres = collections.premieres.len(),
            "Opened embedded store"
        );
        Ok(Self {
            state: RwLock::new(collections),
            snapshot: Some(snapshot),
        })
    }

    /// Run a mutation under the write lock. The closure reports whether it
    /// changed anything.
    ///
    /// With a snapshot file the mutation runs on a copy, which replaces the
    /// live state only once it is on disk; a failed persist changes nothing.
    async fn write<R, F>(&self, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Collections) -> StoreResult<(R, bool)>,
    {
        let mut state = self.state.write().await;
        let Some(snapshot) = &self.snapshot else {
            let (value, _) = f(&mut state)?;
            return Ok(value);
        };

        let mut next = Collections::clone(&state);
        let (value, changed) = f(&mut next)?;
        if changed {
            let bytes = SnapshotFile::encode(&next)?;
            snapshot.write(bytes).await?;
            *state = next;
        }
        Ok(value)
    }
}

#[async_trait]
impl MovieStore for EmbeddedStore {
    async fn insert_movie(&self, movie: Movie) -> StoreResult<()> {
        self.write(|c| {
            if c.movies.contains_key(&movie.id) {
                return Err(StoreError::conflict("movie", movie.id.clone()));
            }
            c.movies.insert(movie.id.clone(), movie);
            Ok(((), true))
        })
        .await
    }

    async fn get_movie(&self, id: &str) -> StoreResult<Option<Movie>> {
        Ok(self.state.read().await.movies.get(id).cloned())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let mut movies: Vec<Movie> = self.state.read().await.movies.values().cloned().collect();
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(movies)
    }

    async fn update_movie_details(&self, id: &str, draft: MovieDraft) -> StoreResult<Movie> {
        self.write(|c| {
            let movie = c.movie_mut(id)?;
            movie.apply_draft(draft);
            Ok((movie.clone(), true))
        })
        .await
    }

    async fn set_movie_flag(&self, id: &str, flag: MovieFlag, value: bool) -> StoreResult<Movie> {
        self.write(|c| {
            let movie = c.movie_mut(id)?;
            let changed = movie.flag(flag) != value;
            movie.set_flag(flag, value);
            Ok((movie.clone(), changed))
        })
        .await
    }

    async fn set_movie_boosts(&self, id: &str, boosts: Boosts) -> StoreResult<Movie> {
        self.write(|c| {
            let movie = c.movie_mut(id)?;
            movie.set_boosts(boosts);
            Ok((movie.clone(), true))
        })
        .await
    }

    async fn delete_movie(&self, id: &str) -> StoreResult<bool> {
        self.write(|c| {
            if c.movies.remove(id).is_none() {
                return Ok((false, false));
            }
            c.ratings.retain(|(movie_id, _), _| movie_id != id);
            c.views.retain(|(movie_id, _), _| movie_id != id);
            c.comments.retain(|_, comment| comment.movie_id != id);
            Ok((true, true))
        })
        .await
    }
}

#[async_trait]
impl RatingStore for EmbeddedStore {
    async fn upsert_rating(
        &self,
        movie_id: &str,
        device_id: &DeviceId,
        stars: Stars,
        now: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome> {
        self.write(|c| {
            if !c.movies.contains_key(movie_id) {
                return Err(StoreError::not_found("movie", movie_id));
            }
            let key = pair(movie_id, device_id.as_str());
            match c.ratings.get_mut(&key) {
                Some(existing) => {
                    existing.rating = stars;
                    existing.updated_at = Some(now);
                    Ok((UpsertOutcome::Updated, true))
                }
                None => {
                    c.ratings.insert(
                        key,
                        Rating {
                            movie_id: movie_id.to_string(),
                            device_id: device_id.clone(),
                            rating: stars,
                            created_at: now,
                            updated_at: None,
                        },
                    );
                    Ok((UpsertOutcome::Inserted, true))
                }
            }
        })
        .await
    }

    async fn ratings_for_movie(&self, movie_id: &str) -> StoreResult<Vec<Rating>> {
        let state = self.state.read().await;
        Ok(state
            .ratings
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn count_ratings(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.ratings.len() as u64)
    }
}

#[async_trait]
impl ViewStore for EmbeddedStore {
    async fn record_view_once(
        &self,
        movie_id: &str,
        device_id: &DeviceId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.write(|c| {
            let key = pair(movie_id, device_id.as_str());
            if c.views.contains_key(&key) {
                c.movie_mut(movie_id)?;
                return Ok((false, false));
            }
            let movie = c.movie_mut(movie_id)?;
            movie.views_real = movie.views_real.saturating_add(1);
            c.views.insert(
                key,
                View {
                    movie_id: movie_id.to_string(),
                    device_id: device_id.clone(),
                    created_at: now,
                },
            );
            Ok((true, true))
        })
        .await
    }
}

#[async_trait]
impl CommentStore for EmbeddedStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        self.write(|c| {
            if c.comments.contains_key(&comment.id) {
                return Err(StoreError::conflict("comment", comment.id.clone()));
            }
            c.comments.insert(comment.id.clone(), comment);
            Ok(((), true))
        })
        .await
    }

    async fn get_comment(&self, id: &str) -> StoreResult<Option<Comment>> {
        Ok(self.state.read().await.comments.get(id).cloned())
    }

    async fn comments_for_movie(&self, movie_id: &str) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .values()
            .filter(|comment| comment.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        let mut comments: Vec<Comment> =
            self.state.read().await.comments.values().cloned().collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn update_comment_text(&self, id: &str, text: String) -> StoreResult<Comment> {
        self.write(|c| {
            let comment = c
                .comments
                .get_mut(id)
                .ok_or_else(|| StoreError::not_found("comment", id))?;
            comment.text = text;
            Ok((comment.clone(), true))
        })
        .await
    }

    async fn delete_comment(&self, id: &str) -> StoreResult<usize> {
        self.write(|c| {
            if c.comments.remove(id).is_none() {
                return Ok((0, false));
            }
            let before = c.comments.len();
            c.comments
                .retain(|_, comment| comment.parent_id.as_deref() != Some(id));
            let removed = 1 + before - c.comments.len();
            Ok((removed, true))
        })
        .await
    }

    async fn count_comments(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.comments.len() as u64)
    }
}

#[async_trait]
impl OtpStore for EmbeddedStore {
    async fn insert_otp(&self, record: OtpRecord) -> StoreResult<()> {
        self.write(|c| {
            c.otps.insert(record.id.clone(), record);
            Ok(((), true))
        })
        .await
    }

    async fn recent_otps(&self, email: &Email, since: DateTime<Utc>) -> StoreResult<Vec<OtpRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<OtpRecord> = state
            .otps
            .values()
            .filter(|r| &r.email == email && r.created_at >= since)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_otp(&self, email: &Email, code: &str) -> StoreResult<Option<OtpRecord>> {
        let state = self.state.read().await;
        Ok(state
            .otps
            .values()
            .filter(|r| &r.email == email && r.code == code)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn bump_otp_attempts(&self, email: &Email) -> StoreResult<Option<u32>> {
        self.write(|c| {
            let newest = c
                .otps
                .values_mut()
                .filter(|r| &r.email == email)
                .max_by_key(|r| r.created_at);
            match newest {
                Some(record) => {
                    record.attempts = record.attempts.saturating_add(1);
                    Ok((Some(record.attempts), true))
                }
                None => Ok((None, false)),
            }
        })
        .await
    }

    async fn delete_otp(&self, id: &str) -> StoreResult<bool> {
        self.write(|c| {
            let removed = c.otps.remove(id).is_some();
            Ok((removed, removed))
        })
        .await
    }

    async fn purge_expired_otps(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        self.write(|c| {
            let before = c.otps.len();
            c.otps.retain(|_, r| !r.is_expired(now));
            let purged = before - c.otps.len();
            if purged > 0 {
                debug!(purged, "Purged expired OTP records");
            }
            Ok((purged, purged > 0))
        })
        .await
    }
}

#[async_trait]
impl PremiereStore for EmbeddedStore {
    async fn insert_premiere(&self, premiere: Premiere) -> StoreResult<()> {
        self.write(|c| {
            if c.premieres.contains_key(&premiere.id) {
                return Err(StoreError::conflict("premiere", premiere.id.clone()));
            }
            c.premieres.insert(premiere.id.clone(), premiere);
            Ok(((), true))
        })
        .await
    }

    async fn get_premiere(&self, id: &str) -> StoreResult<Option<Premiere>> {
        Ok(self.state.read().await.premieres.get(id).cloned())
    }

    async fn list_premieres(&self) -> StoreResult<Vec<Premiere>> {
        let mut premieres: Vec<Premiere> =
            self.state.read().await.premieres.values().cloned().collect();
        premieres.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(premieres)
    }
}

#[async_trait]
impl TicketStore for EmbeddedStore {
    async fn insert_ticket_if_absent(&self, ticket: Ticket) -> StoreResult<bool> {
        self.write(|c| {
            let key = pair(&ticket.premiere_id, ticket.code.as_str());
            if c.tickets.contains_key(&key) {
                return Ok((false, false));
            }
            c.tickets.insert(key, ticket);
            Ok((true, true))
        })
        .await
    }

    async fn count_tickets(&self, premiere_id: &str) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .tickets
            .keys()
            .filter(|(pid, _)| pid == premiere_id)
            .count() as u64)
    }

    async fn list_tickets(&self, premiere_id: &str) -> StoreResult<Vec<Ticket>> {
        let state = self.state.read().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.premiere_id == premiere_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.code.cmp(&b.code)));
        Ok(tickets)
    }

    async fn redeem_ticket(
        &self,
        premiere_id: &str,
        code: &TicketCode,
        used_by: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<RedeemOutcome> {
        self.write(|c| match c.tickets.get_mut(&pair(premiere_id, code.as_str())) {
            None => Ok((RedeemOutcome::NotFound, false)),
            Some(ticket) if ticket.used => Ok((RedeemOutcome::AlreadyUsed, false)),
            Some(ticket) => {
                ticket.used = true;
                ticket.used_by = Some(used_by.to_string());
                ticket.used_at = Some(now);
                Ok((RedeemOutcome::Redeemed(ticket.clone()), true))
            }
        })
        .await
    }

    async fn set_ticket_used(
        &self,
        premiere_id: &str,
        code: &TicketCode,
        used: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>> {
        self.write(|c| match c.tickets.get_mut(&pair(premiere_id, code.as_str())) {
            None => Ok((None, false)),
            Some(ticket) => {
                ticket.used = used;
                if used {
                    ticket.used_by = Some("admin".to_string());
                    ticket.used_at = Some(now);
                } else {
                    ticket.used_by = None;
                    ticket.used_at = None;
                }
                Ok((Some(ticket.clone()), true))
            }
        })
        .await
    }
}

#[async_trait]
impl WishlistStore for EmbeddedStore {
    async fn add_to_wishlist(&self, item: WishlistItem) -> StoreResult<bool> {
        self.write(|c| {
            let key = pair(&item.user_id, &item.movie_id);
            if c.wishlist.contains_key(&key) {
                return Ok((false, false));
            }
            c.wishlist.insert(key, item);
            Ok((true, true))
        })
        .await
    }

    async fn remove_from_wishlist(&self, user_id: &str, movie_id: &str) -> StoreResult<bool> {
        self.write(|c| {
            let removed = c.wishlist.remove(&pair(user_id, movie_id)).is_some();
            Ok((removed, removed))
        })
        .await
    }

    async fn wishlist_contains(&self, user_id: &str, movie_id: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .wishlist
            .contains_key(&pair(user_id, movie_id)))
    }

    async fn wishlist_for_user(&self, user_id: &str) -> StoreResult<Vec<WishlistItem>> {
        let state = self.state.read().await;
        let mut items: Vec<WishlistItem> = state
            .wishlist
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marquee_models::{CommentAuthor, TicketCode};

    fn movie(id: &str) -> Movie {
        Movie::from_draft(
            id.to_string(),
            MovieDraft {
                title: format!("Movie {}", id),
                ..MovieDraft::default()
            },
            Utc::now(),
        )
    }

    fn comment(id: &str, movie_id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            movie_id: movie_id.to_string(),
            author: CommentAuthor {
                name: "User".to_string(),
                ..CommentAuthor::default()
            },
            text: "hello".to_string(),
            is_admin: false,
            parent_id: parent.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn device(raw: &str) -> DeviceId {
        DeviceId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_rating_keeps_one_per_device() {
        let store = EmbeddedStore::in_memory();
        store.insert_movie(movie("m1")).await.unwrap();
        let d = device("dev-1");

        let first = store
            .upsert_rating("m1", &d, Stars::new(3).unwrap(), Utc::now())
            .await
            .unwrap();
        let second = store
            .upsert_rating("m1", &d, Stars::new(5).unwrap(), Utc::now())
            .await
            .unwrap();

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Updated);
        let ratings = store.ratings_for_movie("m1").await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].rating.get(), 5);
        assert!(ratings[0].updated_at.is_some());
    }

    #[tokio::test]
    async fn test_rating_unknown_movie() {
        let store = EmbeddedStore::in_memory();
        let result = store
            .upsert_rating("missing", &device("d"), Stars::new(4).unwrap(), Utc::now())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_record_view_once_counts_first_view_only() {
        let store = EmbeddedStore::in_memory();
        store.insert_movie(movie("m1")).await.unwrap();
        let d = device("dev-1");

        assert!(store.record_view_once("m1", &d, Utc::now()).await.unwrap());
        assert!(!store.record_view_once("m1", &d, Utc::now()).await.unwrap());
        assert!(store.record_view_once("m1", &device("dev-2"), Utc::now()).await.unwrap());

        let m = store.get_movie("m1").await.unwrap().unwrap();
        assert_eq!(m.views_real, 2);
        assert!(store.record_view_once("nope", &d, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_views_from_one_device() {
        let store = std::sync::Arc::new(EmbeddedStore::in_memory());
        store.insert_movie(movie("m1")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_view_once("m1", &DeviceId::parse("same").unwrap(), Utc::now())
                    .await
                    .unwrap()
            }));
        }
        let mut counted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                counted += 1;
            }
        }

        assert_eq!(counted, 1);
        assert_eq!(store.get_movie("m1").await.unwrap().unwrap().views_real, 1);
    }

    #[tokio::test]
    async fn test_delete_comment_cascades_replies() {
        let store = EmbeddedStore::in_memory();
        store.insert_comment(comment("c1", "m1", None)).await.unwrap();
        store.insert_comment(comment("r1", "m1", Some("c1"))).await.unwrap();
        store.insert_comment(comment("r2", "m1", Some("c1"))).await.unwrap();
        store.insert_comment(comment("c2", "m1", None)).await.unwrap();

        assert_eq!(store.delete_comment("c1").await.unwrap(), 3);
        assert_eq!(store.count_comments().await.unwrap(), 1);
        assert_eq!(store.delete_comment("c1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_redeem_ticket_is_one_shot() {
        let store = EmbeddedStore::in_memory();
        let code = TicketCode::parse("AB3F-92K1").unwrap();
        let ticket = Ticket::new("p1".to_string(), code.clone(), Utc::now());

        assert!(store.insert_ticket_if_absent(ticket.clone()).await.unwrap());
        assert!(!store.insert_ticket_if_absent(ticket).await.unwrap());

        let first = store.redeem_ticket("p1", &code, "u1", Utc::now()).await.unwrap();
        assert!(matches!(first, RedeemOutcome::Redeemed(ref t) if t.used_by.as_deref() == Some("u1")));

        let second = store.redeem_ticket("p1", &code, "u2", Utc::now()).await.unwrap();
        assert_eq!(second, RedeemOutcome::AlreadyUsed);

        let other = store.redeem_ticket("p2", &code, "u1", Utc::now()).await.unwrap();
        assert_eq!(other, RedeemOutcome::NotFound);

        let reset = store.set_ticket_used("p1", &code, false, Utc::now()).await.unwrap().unwrap();
        assert!(!reset.used);
        assert!(reset.used_by.is_none());
    }

    #[tokio::test]
    async fn test_otp_attempts_and_purge() {
        let store = EmbeddedStore::in_memory();
        let email = Email::parse("admin@example.com").unwrap();
        let now = Utc::now();
        store
            .insert_otp(OtpRecord {
                id: "o1".to_string(),
                email: email.clone(),
                code: "123456".to_string(),
                created_at: now,
                expires_at: now + Duration::minutes(5),
                attempts: 0,
            })
            .await
            .unwrap();

        assert_eq!(store.bump_otp_attempts(&email).await.unwrap(), Some(1));
        assert!(store.find_otp(&email, "123456").await.unwrap().is_some());
        assert!(store.find_otp(&email, "654321").await.unwrap().is_none());

        assert_eq!(store.purge_expired_otps(now).await.unwrap(), 0);
        assert_eq!(store.purge_expired_otps(now + Duration::minutes(6)).await.unwrap(), 1);
        assert!(store.recent_otps(&email, now - Duration::minutes(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_movie_cascades() {
        let store = EmbeddedStore::in_memory();
        store.insert_movie(movie("m1")).await.unwrap();
        store
            .upsert_rating("m1", &device("d1"), Stars::new(4).unwrap(), Utc::now())
            .await
            .unwrap();
        store.insert_comment(comment("c1", "m1", None)).await.unwrap();

        assert!(store.delete_movie("m1").await.unwrap());
        assert_eq!(store.count_ratings().await.unwrap(), 0);
        assert_eq!(store.count_comments().await.unwrap(), 0);
        assert!(!store.delete_movie("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.bin");

        {
            let store = EmbeddedStore::open(path.clone()).unwrap();
            store.insert_movie(movie("m1")).await.unwrap();
            store
                .upsert_rating("m1", &device("d1"), Stars::new(4).unwrap(), Utc::now())
                .await
                .unwrap();
            store.record_view_once("m1", &device("d1"), Utc::now()).await.unwrap();
        }

        let reopened = EmbeddedStore::open(path).unwrap();
        let m = reopened.get_movie("m1").await.unwrap().unwrap();
        assert_eq!(m.views_real, 1);
        assert_eq!(reopened.ratings_for_movie("m1").await.unwrap().len(), 1);
        assert!(!reopened.record_view_once("m1", &device("d1"), Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        // Parent of the snapshot is a regular file, so no write can land
        let store = EmbeddedStore::open(blocker.join("store.bin")).unwrap();
        assert!(store.insert_movie(movie("m1")).await.is_err());
        assert!(store.get_movie("m1").await.unwrap().is_none());

        let path = dir.path().join("store.bin");
        let store = EmbeddedStore::open(path.clone()).unwrap();
        let code = TicketCode::parse("AB3F-92K1").unwrap();
        let ticket = Ticket::new("p1".to_string(), code.clone(), Utc::now());
        assert!(store.insert_ticket_if_absent(ticket).await.unwrap());

        // A directory where the temp file goes makes the next persist fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(store.redeem_ticket("p1", &code, "u1", Utc::now()).await.is_err());

        let tickets = store.list_tickets("p1").await.unwrap();
        assert!(!tickets[0].used);
        assert!(tickets[0].used_by.is_none());
    }

    #[tokio::test]
    async fn test_wishlist() {
        let store = EmbeddedStore::in_memory();
        let item = WishlistItem {
            user_id: "u1".to_string(),
            movie_id: "m1".to_string(),
            title: "Movie".to_string(),
            poster_image: None,
            added_at: Utc::now(),
        };

        assert!(store.add_to_wishlist(item.clone()).await.unwrap());
        assert!(!store.add_to_wishlist(item).await.unwrap());
        assert!(store.wishlist_contains("u1", "m1").await.unwrap());
        assert!(store.remove_from_wishlist("u1", "m1").await.unwrap());
        assert!(store.wishlist_for_user("u1").await.unwrap().is_empty());
    }
}
