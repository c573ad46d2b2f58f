//! Kirakuji Server - 匿名投稿 → LLM 整形 → 审核 → 随机抽签
//!
//! # 架构概述
//!
//! - **存储** (`db`): Post / Draw 存储契约，memory 和 redb 两种实现
//! - **整形** (`formatter`): OpenAI / Gemini 文本改写
//! - **审核** (`moderation`): 纯函数规则引擎
//! - **流水线** (`worker`): 整形 → 审核编排、任务队列、后台 Worker
//! - **抽签** (`fortune`): 从 Verified Draw 中随机抽取
//! - **HTTP API** (`api`): 投稿、抽签、健康检查
//!
//! # 模块结构
//!
//! ```text
//! kirakuji-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── db/            # 存储层
//! ├── formatter/     # LLM 整形
//! ├── moderation/    # 审核规则
//! ├── worker/        # 整形流水线
//! ├── fortune/       # 抽签
//! ├── services/      # 投稿受理
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod formatter;
pub mod fortune;
pub mod moderation;
pub mod services;
pub mod utils;
pub mod worker;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use db::{DrawStore, MemoryStore, PostStore, RedbStore, StoreError};
pub use formatter::{Formatter, FormatterError, LlmProvider};
pub use fortune::{FortuneError, FortuneSelector};
pub use services::{SubmissionService, SubmitError};
pub use utils::{AppError, AppResult};
pub use worker::{Orchestrator, RunOutcome, WorkflowError};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

pub fn print_banner() {
    println!(
        r#"
    __ __ _           __          _ _
   / //_/(_)________ _/ /____  __(_|_)
  / ,<  / / ___/ __ `/ //_/ / / / / /
 / /| |/ / /  / /_/ / ,< / /_/ / / /
/_/ |_/_/_/   \__,_/_/|_|\__,_/_/ /
                            /___/
    "#
    );
}
