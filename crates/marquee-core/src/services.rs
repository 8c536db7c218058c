use marquee_config::Config;
use marquee_store::{Mailer, Store};
use std::sync::Arc;
use crate::comments::CommentService;
use crate::movies::MovieService;
use crate::otp::{OtpService, OtpSettings};
use crate::premieres::PremiereService;
use crate::ratings::{RatingFeed, RatingService};
use crate::session::{AdminPolicy, SessionSigner};
use crate::tickets::TicketService;
use crate::views::ViewService;
use crate::wishlist::WishlistService;
use crate::CoreResult;

/// Every domain service wired to one store, mailer and session secret
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub signer: Arc<SessionSigner>,
    pub otp: Arc<OtpService>,
    pub ratings: Arc<RatingService>,
    pub views: Arc<ViewService>,
    pub movies: Arc<MovieService>,
    pub comments: Arc<CommentService>,
    pub premieres: Arc<PremiereService>,
    pub tickets: Arc<TicketService>,
    pub wishlist: Arc<WishlistService>,
}

impl Services {
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        session_secret: &str,
    ) -> CoreResult<Self> {
        let policy = Arc::new(AdminPolicy::new(config.admin_emails()));
        let signer = Arc::new(SessionSigner::new(session_secret, policy)?);
        let feed = RatingFeed::new();

        Ok(Self {
            otp: Arc::new(OtpService::new(
                store.clone(),
                mailer,
                signer.clone(),
                OtpSettings::from(&config.otp),
            )),
            ratings: Arc::new(RatingService::new(store.clone(), feed.clone())),
            views: Arc::new(ViewService::new(store.clone())),
            movies: Arc::new(MovieService::new(store.clone(), feed)),
            comments: Arc::new(CommentService::new(store.clone())),
            premieres: Arc::new(PremiereService::new(store.clone())),
            tickets: Arc::new(TicketService::new(
                store.clone(),
                config.tickets.format,
                config.tickets.max_batch,
            )),
            wishlist: Arc::new(WishlistService::new(store.clone())),
            signer,
            store,
        })
    }
}
