use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    Conflict { entity: &'static str, id: String },

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            id: id.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider is not configured: {0}")]
    NotConfigured(String),
}
