pub mod config;
pub mod paths;
pub mod secrets;

pub use config::{AuthConfig, Config, EmailConfig, EmailProvider, LoggingConfig, OtpConfig, SchedulerConfig, ServerConfig, StoreBackend, StoreConfig, TicketConfig};
pub use paths::{PathManager, container_base_path};
pub use secrets::{SecretStore, ADMIN_SECRET_ENV, RESEND_API_KEY_ENV};
