//! Post API Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use shared::response::{CreatePostRequest, CreatePostResponse};

use crate::core::ServerState;
use crate::utils::AppResult;

/// POST /posts - 提交投稿
///
/// 请求体无法解析时同样返回 400
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreatePostResponse>)> {
    let Json(req) = payload?;
    let post = state.submission.submit(&req.post_id, &req.content).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            post_id: post.id().to_string(),
        }),
    ))
}
