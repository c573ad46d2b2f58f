//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`posts`] - 投稿
//! - [`draws`] - 抽签

pub mod draws;
pub mod health;
pub mod posts;

use axum::{Router, middleware};
use http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(target: "http_access", "{} {} {}", method, uri, response.status());
    response
}

/// 注册所有路由 (无中间件、无状态)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(posts::router())
        .merge(draws::router())
}

/// 完整应用：路由 + 状态 + 中间件
///
/// HTTP 服务器和测试共用
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    build_router()
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
}

/// 空列表放行所有来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
