//! Construction of the store and mailer from configuration

use marquee_config::{EmailConfig, EmailProvider, SecretStore, StoreBackend, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use crate::{EmbeddedStore, LogMailer, MailError, Mailer, ResendMailer, Store, StoreError};

/// Open the configured store. `default_path` is used for the file backend
/// when the config does not name a snapshot path.
pub fn open_store(config: &StoreConfig, default_path: PathBuf) -> Result<Arc<dyn Store>, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data will not survive a restart");
            Ok(Arc::new(EmbeddedStore::in_memory()))
        }
        StoreBackend::File => {
            let path = config.path.clone().unwrap_or(default_path);
            Ok(Arc::new(EmbeddedStore::open(path)?))
        }
    }
}

pub fn build_mailer(config: &EmailConfig, secrets: &SecretStore) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        EmailProvider::Log => Ok(Arc::new(LogMailer::new())),
        EmailProvider::Resend => {
            let api_key = secrets.resend_api_key().ok_or_else(|| {
                MailError::NotConfigured(
                    "set RESEND_API_KEY or resend_api_key in secrets.toml".to_string(),
                )
            })?;
            let mailer = ResendMailer::new(config.api_url.clone(), api_key, config.from.clone())?;
            info!(provider = "resend", "Email delivery enabled");
            Ok(Arc::new(mailer))
        }
    }
}
