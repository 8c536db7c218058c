pub mod comments;
pub mod dashboard;
pub mod error;
pub mod movies;
pub mod otp;
pub mod premieres;
pub mod ratings;
pub mod services;
pub mod session;
pub mod tickets;
pub mod views;
pub mod wishlist;

pub use comments::{CommentService, CommentView, NewComment, ThreadView};
pub use dashboard::{dashboard, DashboardStats};
pub use error::{CoreError, CoreResult};
pub use movies::{HomeFeed, MovieAnalytics, MovieService, PublicMovie};
pub use otp::{OtpService, OtpSettings};
pub use premieres::{PremiereService, PremiereView};
pub use ratings::{RatingFeed, RatingService};
pub use services::Services;
pub use session::{AdminPolicy, SessionSigner};
pub use tickets::TicketService;
pub use views::{ViewOutcome, ViewService};
pub use wishlist::WishlistService;
