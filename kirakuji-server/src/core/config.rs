use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::formatter::LlmProvider;

/// redb 文件名 (位于 `DATA_DIR` 下)
pub const REDB_FILE_NAME: &str = "kirakuji.redb";

/// 配置错误 (启动时检查)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set when LLM_PROVIDER={1}")]
    MissingApiKey(&'static str, LlmProvider),
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// 进程内存储 (开发 / 测试)
    #[default]
    Memory,
    /// 嵌入式 redb 文件
    Redb,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redb => "redb",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redb" => Ok(StoreBackend::Redb),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 整形 Worker 的驱动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerMode {
    /// 固定间隔轮询
    #[default]
    Polling,
    /// 消费提交时登记的整形任务
    Queue,
    /// 不注册 Worker
    Disabled,
}

impl WorkerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerMode::Polling => "polling",
            WorkerMode::Queue => "queue",
            WorkerMode::Disabled => "disabled",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, WorkerMode::Disabled)
    }
}

impl FromStr for WorkerMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" => Ok(WorkerMode::Polling),
            "queue" => Ok(WorkerMode::Queue),
            "disabled" => Ok(WorkerMode::Disabled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | STORE_BACKEND | memory | memory / redb |
/// | DATA_DIR | ./data | redb 文件目录 |
/// | WORKER_MODE | polling | polling / queue / disabled |
/// | WORKER_POLL_INTERVAL_MS | 5000 | 轮询间隔 (queue 模式下为重试间隔) |
/// | FORMAT_TIMEOUT_MS | 30000 | 整形调用超时 |
/// | JOB_QUEUE_CAPACITY | 256 | 任务队列容量 |
/// | LLM_PROVIDER | openai | openai / gemini |
/// | OPENAI_API_KEY | - | |
/// | OPENAI_MODEL | gpt-4o-mini | |
/// | OPENAI_BASE_URL | https://api.openai.com/v1 | |
/// | GEMINI_API_KEY | - | |
/// | GEMINI_MODEL | gemini-2.5-flash | |
/// | FORTUNE_SEED | - | 抽签随机种子，未设置时使用系统熵 |
/// | CORS_ALLOWED_ORIGINS | - | 逗号分隔，未设置时放行所有来源 |
/// | SEED_POST_CONTENT | - | 启动时写入一条待整形投稿 |
/// | LOG_LEVEL | info | |
/// | LOG_DIR | - | 日志目录 (存在时按天滚动写文件) |
///
/// # 示例
///
/// ```ignore
/// STORE_BACKEND=redb WORKER_MODE=queue cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    pub store_backend: StoreBackend,
    /// 数据目录
    pub data_dir: String,
    pub worker_mode: WorkerMode,
    /// 轮询间隔 (毫秒)
    pub worker_poll_interval_ms: u64,
    /// 整形调用超时 (毫秒)
    pub format_timeout_ms: u64,
    pub job_queue_capacity: usize,

    // === LLM ===
    pub llm_provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    /// 抽签随机种子
    pub fortune_seed: Option<u64>,
    /// 允许的跨域来源，空表示放行所有
    pub cors_allowed_origins: Vec<String>,
    /// 启动时写入的种子投稿
    pub seed_post_content: Option<String>,

    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_port: env_parse("HTTP_PORT").unwrap_or(defaults.http_port),
            environment: env_string("ENVIRONMENT").unwrap_or(defaults.environment),
            store_backend: env_parse("STORE_BACKEND").unwrap_or(defaults.store_backend),
            data_dir: env_string("DATA_DIR").unwrap_or(defaults.data_dir),
            worker_mode: env_parse("WORKER_MODE").unwrap_or(defaults.worker_mode),
            worker_poll_interval_ms: env_parse("WORKER_POLL_INTERVAL_MS")
                .unwrap_or(defaults.worker_poll_interval_ms),
            format_timeout_ms: env_parse("FORMAT_TIMEOUT_MS")
                .unwrap_or(defaults.format_timeout_ms),
            job_queue_capacity: env_parse("JOB_QUEUE_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or(defaults.job_queue_capacity),

            llm_provider: LlmProvider::parse(env_string("LLM_PROVIDER").as_deref()),
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_model: env_string("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: env_string("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            gemini_api_key: env_string("GEMINI_API_KEY"),
            gemini_model: env_string("GEMINI_MODEL").unwrap_or(defaults.gemini_model),

            fortune_seed: env_parse("FORTUNE_SEED"),
            cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            seed_post_content: env_string("SEED_POST_CONTENT"),

            log_level: env_string("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: env_string("LOG_DIR"),
        }
    }

    /// 启动前检查
    ///
    /// Worker 启用时，所选 LLM 提供方的 API key 必须存在
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.worker_mode.is_enabled() {
            return Ok(());
        }
        let key = match self.llm_provider {
            LlmProvider::OpenAi => &self.openai_api_key,
            LlmProvider::Gemini => &self.gemini_api_key,
        };
        if key.is_none() {
            return Err(ConfigError::MissingApiKey(
                self.llm_provider.api_key_var(),
                self.llm_provider,
            ));
        }
        Ok(())
    }

    /// redb 数据库文件路径
    pub fn redb_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(REDB_FILE_NAME)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    pub fn format_timeout(&self) -> Duration {
        Duration::from_millis(self.format_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            environment: "development".into(),
            store_backend: StoreBackend::Memory,
            data_dir: "./data".into(),
            worker_mode: WorkerMode::Polling,
            worker_poll_interval_ms: 5000,
            format_timeout_ms: 30000,
            job_queue_capacity: 256,
            llm_provider: LlmProvider::OpenAi,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: "https://api.openai.com/v1".into(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".into(),
            fortune_seed: None,
            cors_allowed_origins: Vec::new(),
            seed_post_content: None,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

/// 读取非空环境变量
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
