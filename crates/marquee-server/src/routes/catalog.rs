use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use marquee_core::{CommentView, HomeFeed, NewComment, PublicMovie, ThreadView, ViewOutcome};
use marquee_models::{DeviceId, RatingSummary, Stars};
use serde::Deserialize;
use tracing::warn;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    device_id: Option<String>,
}

impl DeviceQuery {
    fn device(&self) -> ApiResult<Option<DeviceId>> {
        match self.device_id.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(raw) => Ok(Some(DeviceId::parse(raw).map_err(marquee_core::CoreError::from)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewBody {
    device_id: DeviceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBody {
    device_id: DeviceId,
    rating: Stars,
}

pub async fn home(State(state): State<AppState>) -> ApiResult<Json<HomeFeed>> {
    Ok(Json(state.services.movies.home().await?))
}

pub async fn list_movies(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicMovie>>> {
    let movies = state.services.movies.list().await?;
    Ok(Json(movies.iter().map(PublicMovie::from).collect()))
}

pub async fn get_movie(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PublicMovie>> {
    let movie = state.services.movies.get(&id).await?;
    Ok(Json(PublicMovie::from(&movie)))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ViewBody>,
) -> ApiResult<Json<ViewOutcome>> {
    Ok(Json(state.services.views.record(&id, &body.device_id).await?))
}

pub async fn rating_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> ApiResult<Json<RatingSummary>> {
    let device = query.device()?;
    Ok(Json(state.services.ratings.summary(&id, device.as_ref()).await?))
}

pub async fn rate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RateBody>,
) -> ApiResult<Json<RatingSummary>> {
    Ok(Json(state.services.ratings.rate(&id, &body.device_id, body.rating).await?))
}

/// Server-sent `rating` events: the current summary, then one per change
pub async fn rating_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let device = query.device()?;
    // Unknown movies fail before the stream opens
    state.services.ratings.summary(&id, device.as_ref()).await?;

    let stream = state.services.ratings.clone().watch(id, device).map(|update| match update {
        Ok(summary) => Event::default().event("rating").json_data(summary),
        Err(err) => {
            warn!(error = %err, "Rating refresh failed");
            Ok(Event::default().event("error").data("Server error"))
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn comment_threads(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ThreadView>>> {
    let threads = state.services.comments.threads(&id).await?;
    Ok(Json(threads.into_iter().map(ThreadView::from).collect()))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state.services.comments.post(&id, body).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}
