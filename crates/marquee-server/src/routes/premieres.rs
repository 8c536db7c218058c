use axum::extract::{Path, State};
use axum::Json;
use marquee_core::PremiereView;
use marquee_models::Ticket;
use serde::Deserialize;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    user_id: String,
}

pub async fn list_premieres(State(state): State<AppState>) -> ApiResult<Json<Vec<PremiereView>>> {
    Ok(Json(state.services.premieres.list().await?))
}

pub async fn get_premiere(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PremiereView>> {
    Ok(Json(state.services.premieres.get(&id).await?))
}

pub async fn redeem_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RedeemBody>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.services.tickets.redeem(&id, &body.code, &body.user_id).await?))
}
