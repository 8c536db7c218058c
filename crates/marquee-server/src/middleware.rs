use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, Instrument};
use crate::extract::AdminSession;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const LOGIN_PATH: &str = "/admin/login";

fn request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

/// Runs each request inside an `http.request` span and echoes its id back
pub async fn request_tracing(request: Request<Body>, next: Next) -> Response {
    let request_id = request_id(&request);
    let method = request.method().clone();
    let route = request.uri().path().to_string();
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route
    );

    let mut response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| debug!(status = response.status().as_u16(), "Request completed"));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Whether `path` is an admin page that needs a session. The login page and
/// anything under it stay open.
fn is_gated(path: &str) -> bool {
    let admin = path == "/admin" || path.starts_with("/admin/");
    admin && !path.starts_with(LOGIN_PATH)
}

/// Sends unauthenticated visitors of admin pages to the login page
///
/// Applied to the whole router, so unknown paths under `/admin` redirect too
/// instead of leaking a 404 before login.
pub async fn admin_gate(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    if !is_gated(request.uri().path()) {
        return next.run(request).await;
    }
    match AdminSession::from_headers(&state, request.headers()) {
        Some(_) => next.run(request).await,
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}
