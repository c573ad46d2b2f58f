//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::api;
use crate::core::{Result, ServerState};

/// HTTP Server
pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// 监听 `0.0.0.0:HTTP_PORT`，Ctrl+C 时优雅退出
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = TcpListener::bind(addr).await?;

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };
        self.serve(listener, shutdown).await
    }

    /// 在给定 listener 上提供服务，直到 `shutdown` 完成
    ///
    /// 退出时先停止接收请求，再关闭后台任务。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tasks = self.state.start_background_tasks();
        let app = api::build_app(self.state.clone());

        tracing::info!(
            addr = %listener.local_addr()?,
            store = self.state.store_name(),
            worker_mode = %self.state.config.worker_mode,
            "Kirakuji server listening"
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if tasks.check_health() > 0 {
            tracing::warn!("Some background tasks exited before shutdown");
        }
        tasks.shutdown().await;

        served?;
        Ok(())
    }
}
