use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::{CommentView, DashboardStats, MovieAnalytics, PremiereView};
use marquee_models::{Boosts, Movie, MovieDraft, MovieFlag, Premiere, PremiereDraft, Ticket};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use crate::error::ApiResult;
use crate::extract::{AdminSession, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FlagBody {
    value: bool,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct IdsBody {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountBody {
    count: u32,
}

#[derive(Debug, Deserialize)]
pub struct UsedBody {
    used: bool,
}

pub async fn dashboard(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(marquee_core::dashboard(state.services.store.as_ref()).await?))
}

// Movies

pub async fn list_movies(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Vec<Movie>>> {
    Ok(Json(state.services.movies.list().await?))
}

pub async fn create_movie(
    _: AdminSession,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<MovieDraft>,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    Ok((StatusCode::CREATED, Json(state.services.movies.create(draft).await?)))
}

pub async fn get_movie(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.services.movies.get(&id).await?))
}

pub async fn update_movie(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<MovieDraft>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.services.movies.update(&id, draft).await?))
}

pub async fn delete_movie(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.services.movies.delete(&id).await?;
    info!(operation = "delete_movie", movie_id = %id, admin = %admin, "Movie deleted by admin");
    Ok(Json(json!({ "success": true })))
}

pub async fn set_flag(
    _: AdminSession,
    State(state): State<AppState>,
    Path((id, flag)): Path<(String, MovieFlag)>,
    ApiJson(body): ApiJson<FlagBody>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.services.movies.set_flag(&id, flag, body.value).await?))
}

pub async fn set_boosts(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(boosts): ApiJson<Boosts>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.services.movies.set_boosts(&id, boosts).await?))
}

pub async fn reset_boosts(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.services.movies.reset_boosts(&id).await?))
}

pub async fn reset_all_boosts(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let reset = state.services.movies.reset_all_boosts().await?;
    Ok(Json(json!({ "success": true, "reset": reset })))
}

pub async fn analytics(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Vec<MovieAnalytics>>> {
    Ok(Json(state.services.movies.analytics().await?))
}

pub async fn movie_analytics(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MovieAnalytics>> {
    Ok(Json(state.services.movies.analytics_for(&id).await?))
}

// Comments

pub async fn list_comments(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = state.services.comments.list_all().await?;
    Ok(Json(comments.into_iter().map(CommentView::from).collect()))
}

pub async fn edit_comment(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TextBody>,
) -> ApiResult<Json<CommentView>> {
    Ok(Json(state.services.comments.edit(&id, &body.text).await?.into()))
}

pub async fn delete_comment(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state.services.comments.delete(&id).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn delete_comments(
    _: AdminSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<IdsBody>,
) -> ApiResult<Json<Value>> {
    let deleted = state.services.comments.delete_many(&body.ids).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn reply_to_comment(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TextBody>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let reply = state.services.comments.admin_reply(&id, &body.text).await?;
    Ok((StatusCode::CREATED, Json(reply.into())))
}

// Premieres and tickets

pub async fn list_premieres(_: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Vec<PremiereView>>> {
    Ok(Json(state.services.premieres.list().await?))
}

pub async fn create_premiere(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<PremiereDraft>,
) -> ApiResult<(StatusCode, Json<Premiere>)> {
    let premiere = state.services.premieres.create(draft, admin.as_str()).await?;
    Ok((StatusCode::CREATED, Json(premiere)))
}

pub async fn generate_tickets(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CountBody>,
) -> ApiResult<(StatusCode, Json<Vec<Ticket>>)> {
    let tickets = state.services.tickets.generate(&id, body.count).await?;
    Ok((StatusCode::CREATED, Json(tickets)))
}

pub async fn list_tickets(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.services.tickets.list(&id).await?))
}

pub async fn export_tickets(
    _: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let tickets = state.services.tickets.list(&id).await?;
    let mut body = Vec::new();
    marquee_core::tickets::write_csv(&tickets, &mut body)?;
    let disposition = format!("attachment; filename=\"tickets-{}.csv\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn override_ticket(
    _: AdminSession,
    State(state): State<AppState>,
    Path((id, code)): Path<(String, String)>,
    ApiJson(body): ApiJson<UsedBody>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.services.tickets.set_used(&id, &code, body.used).await?))
}
