pub mod embedded;
pub mod error;
pub mod factory;
pub mod mailer;
pub mod snapshot;
pub mod traits;

pub use embedded::EmbeddedStore;
pub use error::{MailError, StoreError};
pub use factory::{build_mailer, open_store};
pub use mailer::{LogMailer, Mailer, OutgoingEmail, ResendMailer};
pub use traits::{
    CommentStore, MovieStore, OtpStore, PremiereStore, RatingStore, RedeemOutcome, Store,
    StoreResult, TicketStore, UpsertOutcome, ViewStore, WishlistStore,
};
