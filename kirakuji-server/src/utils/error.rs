//! 统一错误处理
//!
//! HTTP 边界的错误类型 [`AppError`]，所有错误响应都是：
//!
//! ```json
//! { "message": "post already exists" }
//! ```
//!
//! | 变体 | 状态码 | message |
//! |------|--------|---------|
//! | Validation | 400 | `invalid post request` |
//! | Conflict | 409 | `post already exists` |
//! | NotFound | 404 | `no verified draws available` |
//! | Internal | 500 | `internal server error` |
//!
//! 具体原因只写日志，不返回给客户端。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::response::ErrorBody;
use tracing::error;

use crate::fortune::FortuneError;
use crate::services::SubmitError;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 请求校验失败 (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 投稿冲突 (409)
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// 没有可抽的签 (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// 内部错误 (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给客户端的固定文案
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid post request",
            AppError::Conflict(_) => "post already exists",
            AppError::NotFound(_) => "no verified draws available",
            AppError::Internal(_) => "internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
            }
        }

        let body = Json(ErrorBody::new(self.public_message()));
        (self.status(), body).into_response()
    }
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Validation(e) => AppError::Validation(e.to_string()),
            SubmitError::PostAlreadyExists(id) | SubmitError::JobAlreadyScheduled(id) => {
                AppError::Conflict(id)
            }
            SubmitError::Store(e) => AppError::Internal(e.to_string()),
            SubmitError::Queue(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<FortuneError> for AppError {
    fn from(e: FortuneError) -> Self {
        match e {
            FortuneError::EmptyResult => AppError::NotFound("no verified draws".into()),
            FortuneError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}
