use marquee_config::Config;
use marquee_core::Services;
use std::sync::Arc;
use crate::cookies::CookieSettings;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub cookies: Arc<CookieSettings>,
}

impl AppState {
    pub fn new(services: Services, config: &Config) -> Self {
        Self {
            services,
            cookies: Arc::new(CookieSettings::from_config(config)),
        }
    }
}
