use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use marquee_config::{Config, PathManager, SecretStore, ADMIN_SECRET_ENV};
use marquee_core::Services;
use marquee_store::{build_mailer, open_store, LogMailer, Mailer};
use std::sync::Arc;

pub mod config;
pub mod movies;
pub mod otp;
pub mod serve;
pub mod tickets;
pub mod token;

/// Paths, configuration and secrets shared by every command
pub struct Context {
    pub paths: PathManager,
    pub config: Config,
    pub secrets: SecretStore,
}

impl Context {
    /// Load config and secrets; a missing config file yields the defaults
    pub fn load(paths: PathManager) -> Result<Self> {
        let config_file = paths.config_file();
        let config = if config_file.exists() {
            Config::load_from_file(&config_file)
                .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?
        } else {
            Config::default()
        };

        let mut secrets = SecretStore::new(paths.secrets_file());
        secrets
            .load()
            .map_err(|e| eyre!("Failed to load secrets from {}: {}", paths.secrets_file().display(), e))?;

        Ok(Self {
            paths,
            config,
            secrets,
        })
    }

    pub fn config_exists(&self) -> bool {
        self.paths.config_file().exists()
    }

    pub fn session_secret(&self) -> Result<String> {
        self.secrets.admin_secret().ok_or_else(|| {
            eyre!(
                "No admin secret configured. Run 'marquee config init' or set {}",
                ADMIN_SECRET_ENV
            )
        })
    }

    /// Services over the configured store. Maintenance commands pass
    /// `deliver_mail = false` and get a logging mailer.
    pub fn services(&self, deliver_mail: bool) -> Result<Services> {
        self.paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;
        let store = open_store(&self.config.store, self.paths.store_file())
            .wrap_err("Failed to open the store")?;
        let mailer: Arc<dyn Mailer> = if deliver_mail {
            build_mailer(&self.config.email, &self.secrets).wrap_err("Failed to set up email delivery")?
        } else {
            Arc::new(LogMailer::new())
        };
        Ok(Services::new(&self.config, store, mailer, &self.session_secret()?)?)
    }
}
