use marquee_models::ModelError;
use marquee_store::{MailError, StoreError};
use thiserror::Error;

/// Failure of a domain operation
///
/// Display strings of the client-facing variants are the messages shown to
/// users; backend variants are logged and never shown.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// Generic OTP rejection; never says which check failed
    #[error("Invalid or expired OTP")]
    InvalidCode,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Invalid ticket code")]
    TicketInvalid,

    #[error("Ticket already used")]
    TicketAlreadyUsed,

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Store(StoreError),

    #[error("email delivery failure: {0}")]
    Mail(#[from] MailError),

    #[error("export failure: {0}")]
    Export(#[from] csv::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict { entity, id } => {
                Self::Conflict(format!("{} already exists: {}", entity, id))
            }
            other => Self::Store(other),
        }
    }
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
