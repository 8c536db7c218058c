use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use marquee_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by every API handler
///
/// Renders as `{"success": false, "error": "..."}`. Backend failures are
/// logged here and reach the client only as "Server error".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::InvalidCode | CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                CoreError::TicketInvalid => StatusCode::BAD_REQUEST,
                CoreError::TicketAlreadyUsed | CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::Store(_) | CoreError::Mail(_) | CoreError::Export(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::validation("Email required"), StatusCode::BAD_REQUEST),
            (CoreError::not_found("movie", "m1"), StatusCode::NOT_FOUND),
            (CoreError::InvalidCode, StatusCode::UNAUTHORIZED),
            (CoreError::Forbidden("Not authorized".into()), StatusCode::FORBIDDEN),
            (CoreError::RateLimited("Wait".into()), StatusCode::TOO_MANY_REQUESTS),
            (CoreError::TicketAlreadyUsed, StatusCode::CONFLICT),
            (
                CoreError::Store(StoreError::Io(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
