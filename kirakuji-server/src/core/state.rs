use std::sync::Arc;

use crate::core::{BackgroundTasks, Config, Result, StoreBackend, TaskKind, WorkerMode};
use crate::db::{DrawStore, MemoryStore, PostStore, RedbStore};
use crate::formatter::{self, Formatter};
use crate::fortune::FortuneSelector;
use crate::services::SubmissionService;
use crate::worker::{JobQueue, Orchestrator, Trigger, Worker};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，作为 axum 的 `State` 传给每个 handler。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | posts / draws | 存储 (memory 或 redb，同一实例) |
/// | fortune | 抽签 |
/// | submission | 投稿受理 |
/// | jobs | 整形任务队列 (仅 queue 模式) |
/// | formatter | LLM 整形 (Worker 启用时) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub posts: Arc<dyn PostStore>,
    pub draws: Arc<dyn DrawStore>,
    pub fortune: Arc<FortuneSelector>,
    pub submission: Arc<SubmissionService>,
    pub jobs: Option<JobQueue>,
    pub formatter: Option<Arc<dyn Formatter>>,
}

impl ServerState {
    /// 用已构建好的存储和 Formatter 组装状态
    pub fn new(
        config: Config,
        posts: Arc<dyn PostStore>,
        draws: Arc<dyn DrawStore>,
        formatter: Option<Arc<dyn Formatter>>,
    ) -> Self {
        let jobs = match config.worker_mode {
            WorkerMode::Queue => Some(JobQueue::new(config.job_queue_capacity)),
            WorkerMode::Polling | WorkerMode::Disabled => None,
        };
        let fortune = Arc::new(FortuneSelector::new(draws.clone(), config.fortune_seed));
        let submission = Arc::new(SubmissionService::new(posts.clone(), jobs.clone()));

        Self {
            config,
            posts,
            draws,
            fortune,
            submission,
            jobs,
            formatter,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 存储 (redb 时确保数据目录存在)
    /// 2. Formatter (仅 Worker 启用时)
    pub async fn initialize(config: &Config) -> Result<Self> {
        let (posts, draws): (Arc<dyn PostStore>, Arc<dyn DrawStore>) = match config.store_backend {
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn PostStore>, store as Arc<dyn DrawStore>)
            }
            StoreBackend::Redb => {
                std::fs::create_dir_all(&config.data_dir)?;
                let path = config.redb_path();
                let store = Arc::new(RedbStore::open(&path)?);
                tracing::info!(path = %path.display(), "Opened redb store");
                (store.clone() as Arc<dyn PostStore>, store as Arc<dyn DrawStore>)
            }
        };

        let formatter = if config.worker_mode.is_enabled() {
            Some(formatter::from_config(config)?)
        } else {
            None
        };

        Ok(Self::new(config.clone(), posts, draws, formatter))
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。queue 模式下取走任务队列的接收端，
    /// 因此只能调用一次。
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let Some(formatter) = self.formatter.clone() else {
            tracing::info!(mode = %self.config.worker_mode, "Format worker not started");
            return tasks;
        };

        let orchestrator = Orchestrator::new(
            self.posts.clone(),
            self.draws.clone(),
            formatter,
            self.config.format_timeout(),
        );
        let worker = Worker::new(Arc::new(orchestrator));
        let token = tasks.shutdown_token();

        match self.config.worker_mode {
            WorkerMode::Polling => {
                let trigger = Trigger::Poll(self.config.poll_interval());
                tasks.spawn("format_worker", TaskKind::Periodic, worker.run(trigger, token));
            }
            WorkerMode::Queue => {
                match self.jobs.as_ref().and_then(JobQueue::take_receiver) {
                    Some(jobs) => {
                        let trigger = Trigger::Queue {
                            jobs,
                            retry_after: self.config.poll_interval(),
                        };
                        tasks.spawn("format_worker", TaskKind::Worker, worker.run(trigger, token));
                    }
                    None => tracing::warn!("Job queue receiver already taken, format worker not started"),
                }
            }
            WorkerMode::Disabled => {}
        }

        tasks.log_summary();
        tasks
    }

    /// 存储后端名称 (health 接口使用)
    pub fn store_name(&self) -> &'static str {
        self.config.store_backend.as_str()
    }
}
