//! Draw API Handlers

use axum::{Json, extract::State};
use shared::response::DrawResponse;

use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /draws/random - 随机抽一条 Verified 签
pub async fn random(State(state): State<ServerState>) -> AppResult<Json<DrawResponse>> {
    let draw = state.fortune.draw_fortune().await?;
    Ok(Json(DrawResponse::from(&draw)))
}
