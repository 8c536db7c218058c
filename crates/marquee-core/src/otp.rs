use chrono::{DateTime, Duration, Utc};
use marquee_config::OtpConfig;
use marquee_models::{Email, OtpRecord};
use marquee_store::{Mailer, OtpStore, OutgoingEmail, Store};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::session::SessionSigner;
use crate::{CoreError, CoreResult};

pub const COOLDOWN_MESSAGE: &str = "Wait before requesting new OTP.";
pub const WINDOW_MESSAGE: &str = "Too many OTP requests. Try later.";

#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub code_ttl: Duration,
    pub cooldown: Duration,
    pub window: Duration,
    pub max_per_window: usize,
    pub max_attempts: u32,
}

impl From<&OtpConfig> for OtpSettings {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_ttl: Duration::seconds(config.code_ttl_secs as i64),
            cooldown: Duration::seconds(config.cooldown_secs as i64),
            window: Duration::seconds(config.window_secs as i64),
            max_per_window: config.max_per_window as usize,
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self::from(&OtpConfig::default())
    }
}

/// Admin login by emailed one-time passcode
pub struct OtpService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    signer: Arc<SessionSigner>,
    settings: OtpSettings,
    // Serializes the rate-limit check with the insert that follows it
    issue_lock: Mutex<()>,
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

impl OtpService {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        signer: Arc<SessionSigner>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            signer,
            settings,
            issue_lock: Mutex::new(()),
        }
    }

    pub async fn request_code(&self, raw_email: &str) -> CoreResult<()> {
        self.request_code_at(raw_email, Utc::now()).await
    }

    pub async fn request_code_at(&self, raw_email: &str, now: DateTime<Utc>) -> CoreResult<()> {
        if raw_email.trim().is_empty() {
            return Err(CoreError::validation("Email required"));
        }
        let email = Email::parse(raw_email).map_err(|_| CoreError::validation("Invalid email"))?;
        if !self.signer.policy().is_admin(&email) {
            warn!(operation = "otp_request", email = %email, "OTP requested for non-admin email");
            return Err(CoreError::Forbidden("Not authorized".to_string()));
        }

        let _guard = self.issue_lock.lock().await;

        let recent: Vec<OtpRecord> = self
            .store
            .recent_otps(&email, now - self.settings.window)
            .await?
            .into_iter()
            .filter(|r| now - r.created_at < self.settings.window)
            .collect();

        if let Some(last) = recent.first() {
            if now - last.created_at < self.settings.cooldown {
                debug!(operation = "otp_request", email = %email, "OTP cooldown active");
                return Err(CoreError::RateLimited(COOLDOWN_MESSAGE.to_string()));
            }
        }
        if recent.len() >= self.settings.max_per_window {
            debug!(operation = "otp_request", email = %email, count = recent.len(), "OTP window exhausted");
            return Err(CoreError::RateLimited(WINDOW_MESSAGE.to_string()));
        }

        let record = OtpRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            code: generate_code(),
            created_at: now,
            expires_at: now + self.settings.code_ttl,
            attempts: 0,
        };
        self.store.insert_otp(record.clone()).await?;

        if let Err(e) = self.mailer.send(&self.otp_email(&record)).await {
            warn!(operation = "otp_request", email = %email, provider = self.mailer.provider_name(), error = %e, "OTP email failed");
            // Undelivered codes must not count against the rate limit
            if let Err(cleanup) = self.store.delete_otp(&record.id).await {
                warn!(operation = "otp_request", email = %email, error = %cleanup, "Failed to discard undelivered OTP");
            }
            return Err(e.into());
        }

        info!(operation = "otp_request", email = %email, provider = self.mailer.provider_name(), "OTP issued");
        Ok(())
    }

    fn otp_email(&self, record: &OtpRecord) -> OutgoingEmail {
        let minutes = self.settings.code_ttl.num_minutes().max(1);
        OutgoingEmail {
            to: record.email.to_string(),
            subject: "Admin OTP Verification".to_string(),
            html: format!(
                "<div style=\"font-family: sans-serif;\"><h2>Your OTP is: {}</h2><p>Valid for {} minutes.</p></div>",
                record.code, minutes
            ),
            text: format!("Your OTP is: {}\nValid for {} minutes.", record.code, minutes),
        }
    }

    /// Exchange a code for a session token
    pub async fn verify(&self, raw_email: &str, code: &str) -> CoreResult<String> {
        self.verify_at(raw_email, code, Utc::now()).await
    }

    pub async fn verify_at(&self, raw_email: &str, code: &str, now: DateTime<Utc>) -> CoreResult<String> {
        let email = Email::parse(raw_email).map_err(|_| CoreError::InvalidCode)?;
        let code = code.trim();
        if code.is_empty() || !self.signer.policy().is_admin(&email) {
            return Err(CoreError::InvalidCode);
        }

        let Some(record) = self.store.find_otp(&email, code).await? else {
            let attempts = self.store.bump_otp_attempts(&email).await?;
            debug!(operation = "otp_verify", email = %email, attempts = ?attempts, "OTP mismatch");
            return Err(CoreError::InvalidCode);
        };

        if record.is_expired(now) || record.attempts >= self.settings.max_attempts {
            self.store.delete_otp(&record.id).await?;
            debug!(operation = "otp_verify", email = %email, "OTP expired or exhausted");
            return Err(CoreError::InvalidCode);
        }

        // Whoever deletes the record owns the login
        if !self.store.delete_otp(&record.id).await? {
            return Err(CoreError::InvalidCode);
        }

        let token = self.signer.issue(&email)?;
        info!(operation = "otp_verify", email = %email, "Admin session issued");
        Ok(token)
    }

    pub async fn purge_expired(&self) -> CoreResult<usize> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> CoreResult<usize> {
        let purged = self.store.purge_expired_otps(now).await?;
        if purged > 0 {
            info!(operation = "otp_sweep", purged, "Purged expired OTP records");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AdminPolicy;
    use marquee_store::{EmbeddedStore, LogMailer};

    struct Fixture {
        service: OtpService,
        mailer: Arc<LogMailer>,
        signer: Arc<SessionSigner>,
    }

    fn fixture() -> Fixture {
        let policy = Arc::new(AdminPolicy::new([Email::parse("admin@example.com").unwrap()]));
        let signer = Arc::new(SessionSigner::new("secret", policy).unwrap());
        let mailer = Arc::new(LogMailer::new());
        let store: Arc<dyn Store> = Arc::new(EmbeddedStore::in_memory());
        let service = OtpService::new(store, mailer.clone(), signer.clone(), OtpSettings::default());
        Fixture {
            service,
            mailer,
            signer,
        }
    }

    /// Rejects every message. With `blocker` set it first creates that
    /// directory, so a store persisting through it fails its next write.
    struct RejectingMailer {
        blocker: Option<std::path::PathBuf>,
    }

    #[async_trait::async_trait]
    impl Mailer for RejectingMailer {
        fn provider_name(&self) -> &str {
            "rejecting"
        }

        async fn send(&self, _message: &OutgoingEmail) -> Result<(), marquee_store::MailError> {
            if let Some(dir) = &self.blocker {
                std::fs::create_dir_all(dir).unwrap();
            }
            Err(marquee_store::MailError::Rejected {
                status: 500,
                body: "provider down".to_string(),
            })
        }
    }

    fn rejecting_service(store: Arc<dyn Store>, blocker: Option<std::path::PathBuf>) -> OtpService {
        let policy = Arc::new(AdminPolicy::new([Email::parse("admin@example.com").unwrap()]));
        let signer = Arc::new(SessionSigner::new("secret", policy).unwrap());
        OtpService::new(store, Arc::new(RejectingMailer { blocker }), signer, OtpSettings::default())
    }

    async fn last_code(mailer: &LogMailer) -> String {
        let message = mailer.last_message_to("admin@example.com").await.unwrap();
        message
            .text
            .split_whitespace()
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_code_is_six_digits_and_verifies_once() {
        let f = fixture();
        let t0 = Utc::now();
        f.service.request_code_at("Admin@Example.com", t0).await.unwrap();

        let code = last_code(&f.mailer).await;
        let n: u32 = code.parse().unwrap();
        assert!((100_000..=999_999).contains(&n));

        let token = f.service.verify_at("admin@example.com", &code, t0).await.unwrap();
        assert_eq!(f.signer.verify(&token).unwrap().as_str(), "admin@example.com");

        let again = f.service.verify_at("admin@example.com", &code, t0).await;
        assert!(matches!(again, Err(CoreError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_cooldown_and_window_limits() {
        let f = fixture();
        let t0 = Utc::now();
        let at = |secs: i64| t0 + Duration::seconds(secs);

        f.service.request_code_at("admin@example.com", at(0)).await.unwrap();

        let too_soon = f.service.request_code_at("admin@example.com", at(30)).await;
        assert!(matches!(too_soon, Err(CoreError::RateLimited(ref m)) if m == COOLDOWN_MESSAGE));

        f.service.request_code_at("admin@example.com", at(61)).await.unwrap();
        f.service.request_code_at("admin@example.com", at(122)).await.unwrap();

        let fourth = f.service.request_code_at("admin@example.com", at(183)).await;
        assert!(matches!(fourth, Err(CoreError::RateLimited(ref m)) if m == WINDOW_MESSAGE));

        // The first code has left the window by now
        f.service.request_code_at("admin@example.com", at(301)).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let f = fixture();
        let result = f.service.request_code("intruder@example.com").await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
        assert!(f.mailer.outbox().await.is_empty());

        assert!(matches!(f.service.request_code("  ").await, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let f = fixture();
        let t0 = Utc::now();
        f.service.request_code_at("admin@example.com", t0).await.unwrap();
        let code = last_code(&f.mailer).await;

        let late = f
            .service
            .verify_at("admin@example.com", &code, t0 + Duration::minutes(6))
            .await;
        assert!(matches!(late, Err(CoreError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_wrong_guesses_exhaust_code() {
        let f = fixture();
        let t0 = Utc::now();
        f.service.request_code_at("admin@example.com", t0).await.unwrap();
        let code = last_code(&f.mailer).await;
        let wrong = if code == "111111" { "222222" } else { "111111" };

        for _ in 0..3 {
            let result = f.service.verify_at("admin@example.com", wrong, t0).await;
            assert!(matches!(result, Err(CoreError::InvalidCode)));
        }

        let result = f.service.verify_at("admin@example.com", &code, t0).await;
        assert!(matches!(result, Err(CoreError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let f = fixture();
        let t0 = Utc::now();
        f.service.request_code_at("admin@example.com", t0).await.unwrap();
        assert_eq!(f.service.purge_expired_at(t0).await.unwrap(), 0);
        assert_eq!(f.service.purge_expired_at(t0 + Duration::minutes(10)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_undelivered_code_is_discarded() {
        let store: Arc<dyn Store> = Arc::new(EmbeddedStore::in_memory());
        let service = rejecting_service(store.clone(), None);
        let email = Email::parse("admin@example.com").unwrap();
        let t0 = Utc::now();

        let result = service.request_code_at("admin@example.com", t0).await;
        assert!(matches!(result, Err(CoreError::Mail(_))));
        let left = store.recent_otps(&email, t0 - Duration::hours(1)).await.unwrap();
        assert!(left.is_empty());

        // No cooldown from the failed attempt
        let retry = service.request_code_at("admin@example.com", t0).await;
        assert!(matches!(retry, Err(CoreError::Mail(_))));
    }

    #[tokio::test]
    async fn test_mail_error_survives_failed_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn Store> = Arc::new(EmbeddedStore::open(dir.path().join("store.bin")).unwrap());
        let service = rejecting_service(store, Some(dir.path().join("store.tmp")));

        let result = service.request_code_at("admin@example.com", Utc::now()).await;
        assert!(matches!(
            result,
            Err(CoreError::Mail(marquee_store::MailError::Rejected { status: 500, .. }))
        ));
    }
}
