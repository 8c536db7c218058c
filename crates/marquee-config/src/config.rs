use marquee_models::{Email, TicketFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub tickets: TicketConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Adds `Secure` to the session cookie; turn off only for plain-HTTP local runs
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
    /// Allowed CORS origins; empty means same-origin only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The only addresses that may request an OTP or hold an admin session
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl_secs")]
    pub code_ttl_secs: u64,
    #[serde(default = "default_otp_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_otp_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_otp_max_per_window")]
    pub max_per_window: u32,
    #[serde(default = "default_otp_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Nothing survives a restart
    Memory,
    /// In-memory collections snapshotted to `path` after each write
    #[default]
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Snapshot location; defaults to the data directory from `PathManager`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    #[default]
    Log,
    Resend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub provider: EmailProvider,
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default)]
    pub format: TicketFormat,
    #[serde(default = "default_ticket_max_batch")]
    pub max_batch: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first) for the expired OTP sweep
    #[serde(default = "default_otp_sweep_schedule")]
    pub otp_sweep_schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cookie_name() -> String {
    "admin-session".to_string()
}

fn default_session_ttl_secs() -> u64 {
    1800 // 30 minutes
}

fn default_otp_ttl_secs() -> u64 {
    300
}

fn default_otp_cooldown_secs() -> u64 {
    60
}

fn default_otp_window_secs() -> u64 {
    300
}

fn default_otp_max_per_window() -> u32 {
    3
}

fn default_otp_max_attempts() -> u32 {
    3
}

fn default_email_from() -> String {
    "Marquee <onboarding@resend.dev>".to_string()
}

fn default_email_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_ticket_max_batch() -> u32 {
    500
}

fn default_otp_sweep_schedule() -> String {
    "0 */5 * * * *".to_string() // Every 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            secure_cookies: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            cookie_name: default_cookie_name(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_otp_ttl_secs(),
            cooldown_secs: default_otp_cooldown_secs(),
            window_secs: default_otp_window_secs(),
            max_per_window: default_otp_max_per_window(),
            max_attempts: default_otp_max_attempts(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::default(),
            from: default_email_from(),
            api_url: default_email_api_url(),
        }
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            format: TicketFormat::default(),
            max_batch: default_ticket_max_batch(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            otp_sweep_schedule: default_otp_sweep_schedule(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.admin_emails.is_empty() {
            return Err(anyhow::anyhow!("auth.admin_emails is required and cannot be empty"));
        }
        for raw in &self.auth.admin_emails {
            Email::parse(raw).map_err(|e| anyhow::anyhow!("auth.admin_emails: {}", e))?;
        }

        let cookie = &self.auth.cookie_name;
        if cookie.is_empty() || cookie.contains(|c: char| c == ';' || c == '=' || c.is_whitespace()) {
            return Err(anyhow::anyhow!("auth.cookie_name is not a valid cookie name: {:?}", cookie));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(anyhow::anyhow!("auth.session_ttl_secs must be positive"));
        }

        if self.otp.code_ttl_secs == 0 || self.otp.window_secs == 0 {
            return Err(anyhow::anyhow!("otp.code_ttl_secs and otp.window_secs must be positive"));
        }
        if self.otp.max_per_window == 0 || self.otp.max_attempts == 0 {
            return Err(anyhow::anyhow!("otp.max_per_window and otp.max_attempts must be at least 1"));
        }

        if self.tickets.max_batch == 0 {
            return Err(anyhow::anyhow!("tickets.max_batch must be at least 1"));
        }

        if self.email.provider == EmailProvider::Resend {
            if self.email.from.trim().is_empty() {
                return Err(anyhow::anyhow!("email.from is required for the resend provider"));
            }
            if !self.email.api_url.starts_with("http") {
                return Err(anyhow::anyhow!("email.api_url must be an http(s) URL"));
            }
        }

        Ok(())
    }

    /// Parsed admin allow-list; entries that fail to parse are skipped
    /// (`validate` reports them).
    pub fn admin_emails(&self) -> Vec<Email> {
        self.auth
            .admin_emails
            .iter()
            .filter_map(|raw| Email::parse(raw).ok())
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
