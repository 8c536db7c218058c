use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use marquee_core::CoreError;
use marquee_models::Email;
use crate::error::ApiError;
use crate::state::AppState;

/// `Json` whose rejection renders in the API's error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Verified admin behind the session cookie
///
/// Handlers taking this extractor answer 401 when the cookie is missing,
/// forged, or names an email that is no longer an admin.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Email);

impl AdminSession {
    pub fn from_headers(state: &AppState, headers: &axum::http::HeaderMap) -> Option<Self> {
        let token = state.cookies.read(headers)?;
        state.services.signer.verify(token).map(Self)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::from_headers(state, &parts.headers).ok_or(ApiError::Core(CoreError::Unauthorized))
    }
}
