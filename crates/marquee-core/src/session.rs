use hmac::{Hmac, Mac};
use marquee_models::Email;
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::Arc;
use crate::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

/// Server-side admin allow-list
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: HashSet<Email>,
}

impl AdminPolicy {
    pub fn new(admins: impl IntoIterator<Item = Email>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, email: &Email) -> bool {
        self.admins.contains(email)
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

/// Mints and checks admin session tokens
///
/// A token is `email + "." + hex(HMAC-SHA256(secret, email))`. It carries no
/// expiry of its own; the cookie lifetime bounds it. Verification re-checks
/// the allow-list, so dropping an address from the config ends its sessions.
pub struct SessionSigner {
    secret: Vec<u8>,
    policy: Arc<AdminPolicy>,
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>, policy: Arc<AdminPolicy>) -> CoreResult<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(CoreError::validation("session secret must not be empty"));
        }
        Ok(Self { secret, policy })
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    fn mac(&self, email: &Email) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(email.as_str().as_bytes());
        Some(mac)
    }

    pub fn issue(&self, email: &Email) -> CoreResult<String> {
        let mac = self
            .mac(email)
            .ok_or_else(|| CoreError::validation("session secret rejected by HMAC"))?;
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", email, signature))
    }

    /// The admin email the token was issued to, if the token is genuine and
    /// that email is still an admin.
    pub fn verify(&self, token: &str) -> Option<Email> {
        // Emails contain dots; the signature never does
        let (raw_email, signature) = token.trim().rsplit_once('.')?;
        let email = Email::parse(raw_email).ok()?;
        if email.as_str() != raw_email {
            return None;
        }
        let expected = hex::decode(signature).ok()?;
        self.mac(&email)?.verify_slice(&expected).ok()?;

        if self.policy.is_admin(&email) {
            Some(email)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn signer() -> SessionSigner {
        let policy = Arc::new(AdminPolicy::new([email("a@b.com")]));
        SessionSigner::new("test-secret", policy).unwrap()
    }

    fn reference_signature(secret: &str, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer.issue(&email("a@b.com")).unwrap();
        assert_eq!(token, format!("a@b.com.{}", reference_signature("test-secret", "a@b.com")));
        assert_eq!(signer.verify(&token), Some(email("a@b.com")));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let signer = signer();
        assert_eq!(signer.verify("a@b.com.badsig"), None);
        assert_eq!(signer.verify("a@b.com"), None);
        assert_eq!(signer.verify(""), None);

        let other_secret = format!("a@b.com.{}", reference_signature("other", "a@b.com"));
        assert_eq!(signer.verify(&other_secret), None);
    }

    #[test]
    fn test_signature_for_other_email_rejected() {
        let signer = signer();
        let token = format!("a@b.com.{}", reference_signature("test-secret", "c@d.com"));
        assert_eq!(signer.verify(&token), None);
    }

    #[test]
    fn test_non_admin_token_rejected() {
        let signer = signer();
        let token = signer.issue(&email("former@b.com")).unwrap();
        assert_eq!(signer.verify(&token), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(SessionSigner::new("", Arc::new(AdminPolicy::default())).is_err());
    }
}
