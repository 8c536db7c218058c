use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use crate::error::ApiResult;
use crate::extract::{AdminSession, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpBody {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    otp: String,
}

pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendOtpBody>,
) -> ApiResult<impl IntoResponse> {
    state.services.otp.request_code(&body.email).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerifyOtpBody>,
) -> ApiResult<impl IntoResponse> {
    let token = state.services.otp.verify(&body.email, &body.otp).await?;
    Ok((
        [(header::SET_COOKIE, state.cookies.session(&token))],
        Json(json!({ "success": true })),
    ))
}

pub async fn logout(State(state): State<AppState>, session: Option<AdminSession>) -> impl IntoResponse {
    if let Some(AdminSession(email)) = session {
        info!(operation = "logout", email = %email, "Admin signed out");
    }
    (
        [(header::SET_COOKIE, state.cookies.cleared())],
        Json(json!({ "success": true })),
    )
}

pub async fn session(AdminSession(email): AdminSession) -> impl IntoResponse {
    Json(json!({ "email": email }))
}
