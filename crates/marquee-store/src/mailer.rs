use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::MailError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Transactional email sender
#[async_trait]
pub trait Mailer: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Sends through the Resend HTTP API
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, MailError> {
        if api_key.trim().is_empty() {
            return Err(MailError::NotConfigured("resend api key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn provider_name(&self) -> &str {
        "resend"
    }

    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %message.to, "Email accepted by provider");
        Ok(())
    }
}

/// Logs messages instead of sending them and keeps them in an outbox.
/// For local development and tests.
#[derive(Default)]
pub struct LogMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outbox(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().await.clone()
    }

    pub async fn last_message_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn provider_name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Email (log provider, not delivered)"
        );
        self.outbox.lock().await.push(message.clone());
        Ok(())
    }
}
