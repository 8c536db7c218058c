use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejected input for one of the validated identifier types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidStars(u8),
    #[error("invalid ticket code: {0}")]
    InvalidTicketCode(String),
}

const MAX_EMAIL_LEN: usize = 254;
const MAX_DEVICE_ID_LEN: usize = 128;
const MAX_TICKET_CODE_LEN: usize = 32;

/// Normalized email address (trimmed, lowercased)
///
/// Used as the admin identity for OTP issuance and as the payload of
/// session tokens, so two spellings of the same address must compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty()
            || normalized.len() > MAX_EMAIL_LEN
            || normalized.chars().any(char::is_whitespace)
        {
            return Err(ModelError::InvalidEmail(raw.to_string()));
        }

        match normalized.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(normalized))
            }
            _ => Err(ModelError::InvalidEmail(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-generated anonymous identity used for rating and view deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_DEVICE_ID_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ModelError::InvalidDeviceId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Star rating, 1 to 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ModelError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidStars(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(value: Stars) -> Self {
        value.0
    }
}

/// Premiere admission code, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketCode(String);

impl TicketCode {
    /// Accepts user input: surrounding whitespace is dropped and letters are uppercased.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let normalized = raw.trim().to_uppercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_TICKET_CODE_LEN
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');

        if valid {
            Ok(Self(normalized))
        } else {
            Err(ModelError::InvalidTicketCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TicketCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TicketCode> for String {
    fn from(value: TicketCode) -> Self {
        value.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
