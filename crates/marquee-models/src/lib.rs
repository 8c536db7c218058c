pub mod comment;
pub mod ids;
pub mod movie;
pub mod otp;
pub mod premiere;
pub mod rating;
pub mod ticket;
pub mod view;
pub mod wishlist;

pub use comment::{Comment, CommentAuthor, CommentThread};
pub use ids::{DeviceId, Email, ModelError, Stars, TicketCode};
pub use movie::{Boosts, Movie, MovieDraft, MovieFlag};
pub use otp::OtpRecord;
pub use premiere::{PaymentConfig, PaymentKind, Premiere, PremiereDraft, PremiereStatus, TicketPolicy};
pub use rating::{Rating, RatingSummary};
pub use ticket::{Ticket, TicketFormat};
pub use view::View;
pub use wishlist::WishlistItem;
