use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use marquee_models::WishlistItem;
use serde::Deserialize;
use serde_json::{json, Value};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBody {
    movie_id: String,
}

pub async fn list(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Vec<WishlistItem>>> {
    Ok(Json(state.services.wishlist.list(&user_id).await?))
}

pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<AddBody>,
) -> ApiResult<(StatusCode, Json<WishlistItem>)> {
    let item = state.services.wishlist.add(&user_id, &body.movie_id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn contains(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let present = state.services.wishlist.contains(&user_id, &movie_id).await?;
    Ok(Json(json!({ "inWishlist": present })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let removed = state.services.wishlist.remove(&user_id, &movie_id).await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let present = state.services.wishlist.toggle(&user_id, &movie_id).await?;
    Ok(Json(json!({ "inWishlist": present })))
}
