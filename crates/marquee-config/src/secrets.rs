use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const ADMIN_SECRET_ENV: &str = "MARQUEE_ADMIN_SECRET";
pub const RESEND_API_KEY_ENV: &str = "RESEND_API_KEY";

const ADMIN_SECRET_KEY: &str = "admin_secret";
const RESEND_API_KEY_KEY: &str = "resend_api_key";

#[derive(Debug, Serialize, Deserialize, Default)]
struct SecretsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Server secrets kept out of `config.toml`
///
/// Environment variables take precedence over the file so container
/// deployments can inject secrets without writing them to disk.
pub struct SecretStore {
    path: PathBuf,
    secrets: HashMap<String, String>,
}

impl SecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            secrets: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let data: SecretsData = toml::from_str(&content)?;
            self.secrets = data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = SecretsData {
            data: self.secrets.clone(),
        };
        let content = toml::to_string_pretty(&data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.secrets.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.secrets.insert(key, value);
    }

    fn env_or_file(&self, env_key: &str, file_key: &str) -> Option<String> {
        std::env::var(env_key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.get(file_key).cloned())
    }

    /// HMAC key for admin session tokens
    pub fn admin_secret(&self) -> Option<String> {
        self.env_or_file(ADMIN_SECRET_ENV, ADMIN_SECRET_KEY)
    }

    pub fn set_admin_secret(&mut self, secret: String) {
        self.set(ADMIN_SECRET_KEY.to_string(), secret);
    }

    pub fn resend_api_key(&self) -> Option<String> {
        self.env_or_file(RESEND_API_KEY_ENV, RESEND_API_KEY_KEY)
    }

    pub fn set_resend_api_key(&mut self, key: String) {
        self.set(RESEND_API_KEY_KEY.to_string(), key);
    }
}
