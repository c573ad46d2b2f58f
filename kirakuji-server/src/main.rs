use anyhow::Context;
use kirakuji_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    print_banner();
    tracing::info!(
        environment = %config.environment,
        store = %config.store_backend,
        worker_mode = %config.worker_mode,
        provider = %config.llm_provider,
        "Kirakuji server starting..."
    );

    // 2. 校验配置
    config.validate().context("invalid configuration")?;

    // 3. 初始化服务器状态
    let state = ServerState::initialize(&config)
        .await
        .context("failed to initialize server state")?;

    // 4. 种子投稿 (可选)
    if let Some(content) = &config.seed_post_content {
        let post_id = uuid::Uuid::new_v4().to_string();
        match state.submission.submit(&post_id, content).await {
            Ok(post) => tracing::info!(post_id = %post.id(), "Seed post inserted"),
            Err(e) => tracing::warn!(error = %e, "Failed to insert seed post"),
        }
    }

    // 5. 启动 HTTP 服务器 (同时启动后台任务)
    if let Err(e) = Server::new(state).run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
