use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_models::{
    Boosts, Comment, DeviceId, Email, Movie, MovieDraft, MovieFlag, OtpRecord, Premiere, Rating,
    Stars, Ticket, TicketCode, WishlistItem,
};
use crate::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of writing a device's rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Result of the `used = false -> true` compare-and-set on a ticket
#[derive(Debug, Clone, PartialEq)]
pub enum RedeemOutcome {
    Redeemed(Ticket),
    AlreadyUsed,
    NotFound,
}

// Every write that other writes could race with is a single conditional
// operation here; callers never read-then-write to enforce uniqueness.

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn insert_movie(&self, movie: Movie) -> StoreResult<()>;
    async fn get_movie(&self, id: &str) -> StoreResult<Option<Movie>>;
    /// All movies, newest first
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    /// Replace editable fields, leaving counters and boosts untouched
    async fn update_movie_details(&self, id: &str, draft: MovieDraft) -> StoreResult<Movie>;
    async fn set_movie_flag(&self, id: &str, flag: MovieFlag, value: bool) -> StoreResult<Movie>;
    async fn set_movie_boosts(&self, id: &str, boosts: Boosts) -> StoreResult<Movie>;
    /// Removes the movie with its ratings, views and comments. Returns false if absent.
    async fn delete_movie(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Insert or overwrite the single rating held by `device_id` for `movie_id`
    async fn upsert_rating(
        &self,
        movie_id: &str,
        device_id: &DeviceId,
        stars: Stars,
        now: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome>;
    async fn ratings_for_movie(&self, movie_id: &str) -> StoreResult<Vec<Rating>>;
    async fn count_ratings(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Insert the (movie, device) view if absent and bump `views_real` in the
    /// same step. Returns true when this call counted the view.
    async fn record_view_once(
        &self,
        movie_id: &str,
        device_id: &DeviceId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()>;
    async fn get_comment(&self, id: &str) -> StoreResult<Option<Comment>>;
    async fn comments_for_movie(&self, movie_id: &str) -> StoreResult<Vec<Comment>>;
    /// Every comment across movies, newest first
    async fn list_comments(&self) -> StoreResult<Vec<Comment>>;
    async fn update_comment_text(&self, id: &str, text: String) -> StoreResult<Comment>;
    /// Deletes the comment and, for a top-level comment, its replies.
    /// Returns the number of removed comments.
    async fn delete_comment(&self, id: &str) -> StoreResult<usize>;
    async fn count_comments(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn insert_otp(&self, record: OtpRecord) -> StoreResult<()>;
    /// Records for `email` created at or after `since`, newest first
    async fn recent_otps(&self, email: &Email, since: DateTime<Utc>) -> StoreResult<Vec<OtpRecord>>;
    async fn find_otp(&self, email: &Email, code: &str) -> StoreResult<Option<OtpRecord>>;
    /// Count a failed guess against the newest record for `email`
    async fn bump_otp_attempts(&self, email: &Email) -> StoreResult<Option<u32>>;
    async fn delete_otp(&self, id: &str) -> StoreResult<bool>;
    async fn purge_expired_otps(&self, now: DateTime<Utc>) -> StoreResult<usize>;
}

#[async_trait]
pub trait PremiereStore: Send + Sync {
    async fn insert_premiere(&self, premiere: Premiere) -> StoreResult<()>;
    async fn get_premiere(&self, id: &str) -> StoreResult<Option<Premiere>>;
    /// All premieres, newest first
    async fn list_premieres(&self) -> StoreResult<Vec<Premiere>>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Returns false when the code already exists for the premiere
    async fn insert_ticket_if_absent(&self, ticket: Ticket) -> StoreResult<bool>;
    async fn count_tickets(&self, premiere_id: &str) -> StoreResult<u64>;
    /// Tickets of one premiere in creation order
    async fn list_tickets(&self, premiere_id: &str) -> StoreResult<Vec<Ticket>>;
    async fn redeem_ticket(
        &self,
        premiere_id: &str,
        code: &TicketCode,
        used_by: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<RedeemOutcome>;
    /// Unconditional admin override of the used flag
    async fn set_ticket_used(
        &self,
        premiere_id: &str,
        code: &TicketCode,
        used: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Returns false when the movie was already on the list
    async fn add_to_wishlist(&self, item: WishlistItem) -> StoreResult<bool>;
    async fn remove_from_wishlist(&self, user_id: &str, movie_id: &str) -> StoreResult<bool>;
    async fn wishlist_contains(&self, user_id: &str, movie_id: &str) -> StoreResult<bool>;
    /// Newest first
    async fn wishlist_for_user(&self, user_id: &str) -> StoreResult<Vec<WishlistItem>>;
}

/// Everything the services need from a document backend
pub trait Store:
    MovieStore
    + RatingStore
    + ViewStore
    + CommentStore
    + OtpStore
    + PremiereStore
    + TicketStore
    + WishlistStore
{
}

impl<T> Store for T where
    T: MovieStore
        + RatingStore
        + ViewStore
        + CommentStore
        + OtpStore
        + PremiereStore
        + TicketStore
        + WishlistStore
{
}
