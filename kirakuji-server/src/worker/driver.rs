//! 整形 Worker
//!
//! polling 模式反复调用 [`Orchestrator::run_once`]，下一次轮询就是重试。
//! queue 模式对每个任务调用 [`Orchestrator::run_for`]，只处理任务对应的投稿；
//! 可重试的错误 (整形失败、存储不可用) 在 `retry_after` 之后重新执行该投稿。

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::orchestrator::{Orchestrator, RunOutcome, WorkflowError};
use super::queue::JobReceiver;

/// Worker 的触发方式
pub enum Trigger {
    /// 固定间隔轮询
    Poll(Duration),
    /// 每个任务触发一次
    Queue {
        jobs: JobReceiver,
        retry_after: Duration,
    },
}

/// 整形 Worker
pub struct Worker {
    orchestrator: Arc<Orchestrator>,
}

/// queue 模式下等待重试的投稿
struct RetrySchedule {
    post_ids: VecDeque<String>,
    next_at: Option<Instant>,
    delay: Duration,
}

impl RetrySchedule {
    fn new(delay: Duration) -> Self {
        Self {
            post_ids: VecDeque::new(),
            next_at: None,
            delay,
        }
    }

    fn push(&mut self, post_id: String) {
        if self.post_ids.contains(&post_id) {
            return;
        }
        self.post_ids.push_back(post_id);
        if self.next_at.is_none() {
            self.next_at = Some(Instant::now() + self.delay);
        }
    }

    fn pop(&mut self) -> Option<String> {
        let post_id = self.post_ids.pop_front();
        self.next_at = (!self.post_ids.is_empty()).then(|| Instant::now() + self.delay);
        post_id
    }

    /// 任务已送达，重试列表里的同一投稿不再需要
    fn forget(&mut self, post_id: &str) {
        self.post_ids.retain(|id| id != post_id);
        if self.post_ids.is_empty() {
            self.next_at = None;
        }
    }
}

impl Worker {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// 主循环，直到 `shutdown` 被取消或任务队列关闭
    pub async fn run(self, trigger: Trigger, shutdown: CancellationToken) {
        match trigger {
            Trigger::Poll(interval) => {
                tracing::info!(interval_ms = interval.as_millis() as u64, "Format worker started (polling)");
                self.poll_loop(interval, &shutdown).await;
            }
            Trigger::Queue { jobs, retry_after } => {
                tracing::info!(retry_after_ms = retry_after.as_millis() as u64, "Format worker started (queue)");
                self.queue_loop(jobs, RetrySchedule::new(retry_after), &shutdown).await;
            }
        }
        tracing::info!("Format worker stopped");
    }

    async fn poll_loop(&self, interval: Duration, shutdown: &CancellationToken) {
        loop {
            match self.orchestrator.run_once(shutdown).await {
                Ok(RunOutcome::Idle) => {}
                Ok(outcome) => tracing::debug!(outcome = ?outcome, "Format run finished"),
                Err(e) => tracing::error!(error = %e, "Format run failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.cancelled() => return,
            }
        }
    }

    async fn queue_loop(&self, mut jobs: JobReceiver, mut retries: RetrySchedule, shutdown: &CancellationToken) {
        loop {
            let retry_at = retries.next_at;
            let post_id = tokio::select! {
                job = jobs.recv() => match job {
                    Some(post_id) => {
                        tracing::debug!(post_id = %post_id, "Format job received");
                        retries.forget(&post_id);
                        post_id
                    }
                    None => {
                        tracing::warn!("Job queue closed");
                        return;
                    }
                },
                _ = sleep_until(retry_at), if retry_at.is_some() => match retries.pop() {
                    Some(post_id) => {
                        tracing::debug!(post_id = %post_id, "Retrying format job");
                        post_id
                    }
                    None => continue,
                },
                _ = shutdown.cancelled() => return,
            };

            match self.orchestrator.run_for(&post_id, shutdown).await {
                Ok(outcome) => tracing::debug!(outcome = ?outcome, "Format job finished"),
                Err(WorkflowError::Cancelled) => return,
                Err(e) if e.is_transient() => {
                    tracing::warn!(post_id = %post_id, error = %e, "Format job failed, will retry");
                    retries.push(post_id);
                }
                Err(e) => tracing::error!(post_id = %post_id, error = %e, "Format job failed"),
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
