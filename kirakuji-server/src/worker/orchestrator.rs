//! 整形 → 审核编排
//!
//! 每次 [`Orchestrator::run_once`] 最多处理一条 Pending 投稿；
//! [`Orchestrator::run_for`] 处理指定的投稿 (queue 模式)：
//!
//! ```text
//! find_pending ─▶ 已有 Draw? ──Verified──▶ 补写 Post (Healed)
//!      │              └──────Rejected──▶ 跳过 (Parked)
//!      ▼
//!   format (timeout + cancel)
//!      ▼
//!   moderation ──accepted──▶ Draw(Verified) → Post(Ready)
//!              └─rejected──▶ Draw(Rejected)，Post 保持 Pending
//! ```
//!
//! Draw 先写，Post 后写。Post 写入失败时下一次运行会从 Verified Draw 补写。

use std::sync::Arc;
use std::time::Duration;

use shared::{DomainError, Draw, DrawStatus, Post};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db::{DrawStore, PostStore, StoreError};
use crate::formatter::{Formatter, FormatterError};
use crate::moderation::ModerationRules;

/// 单次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 没有 Pending 投稿，未写入任何数据
    Idle,
    /// 审核通过：Post → Ready，Draw → Verified
    Verified { post_id: String },
    /// 审核拒绝：写入 Rejected Draw，Post 保持 Pending
    Rejected { post_id: String, reason: String },
    /// 上次只写成了 Draw，本次从 Verified Draw 补写 Post
    Healed { post_id: String },
    /// 已有 Rejected Draw 的投稿，跳过
    Parked { post_id: String },
}

/// 编排错误 (审核拒绝不是错误)
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("formatter unavailable: {0}")]
    FormatterUnavailable(#[source] FormatterError),

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// 重新执行整个流程可能成功的错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WorkflowError::FormatterUnavailable(_) | WorkflowError::Store(StoreError::Unavailable(_))
        )
    }
}

/// 整形 → 审核编排器
pub struct Orchestrator {
    posts: Arc<dyn PostStore>,
    draws: Arc<dyn DrawStore>,
    formatter: Arc<dyn Formatter>,
    rules: ModerationRules,
    format_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        posts: Arc<dyn PostStore>,
        draws: Arc<dyn DrawStore>,
        formatter: Arc<dyn Formatter>,
        format_timeout: Duration,
    ) -> Self {
        Self {
            posts,
            draws,
            formatter,
            rules: ModerationRules::default(),
            format_timeout,
        }
    }

    pub fn with_rules(mut self, rules: ModerationRules) -> Self {
        self.rules = rules;
        self
    }

    /// 处理一条 Pending 投稿
    ///
    /// `cancel` 只会打断整形调用；一旦进入写入阶段就会执行完。
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<RunOutcome, WorkflowError> {
        let Some(post) = self.posts.find_pending().await? else {
            return Ok(RunOutcome::Idle);
        };
        self.process(post, cancel).await
    }

    /// 处理指定投稿
    ///
    /// 投稿不存在或已是 Ready 时返回 `Idle`，不写入任何数据。
    pub async fn run_for(&self, post_id: &str, cancel: &CancellationToken) -> Result<RunOutcome, WorkflowError> {
        let Some(post) = self.posts.find_by_id(post_id).await? else {
            tracing::warn!(post_id = %post_id, "Format job for unknown post");
            return Ok(RunOutcome::Idle);
        };
        if post.is_ready() {
            return Ok(RunOutcome::Idle);
        }
        self.process(post, cancel).await
    }

    async fn process(&self, mut post: Post, cancel: &CancellationToken) -> Result<RunOutcome, WorkflowError> {
        let post_id = post.id().to_string();

        match self.draws.get_by_post_id(&post_id).await {
            Ok(draw) => return self.resume(post, draw).await,
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let rewritten = self.format(post.content(), cancel).await?;
        let verdict = self.rules.evaluate(&rewritten);

        match verdict.reason {
            None => {
                post.update_content(rewritten.as_str())?;
                post.mark_ready()?;
                let mut draw = Draw::from_post(&post, rewritten)?;
                draw.mark_verified()?;

                self.draws.create(&draw).await?;
                self.posts.update(&post).await?;

                tracing::info!(post_id = %post_id, "Draw verified");
                Ok(RunOutcome::Verified { post_id })
            }
            Some(reason) => {
                let mut draw = Draw::create(post_id.as_str(), rewritten)?;
                draw.mark_rejected(reason.as_str())?;

                self.draws.create(&draw).await?;

                tracing::info!(post_id = %post_id, reason = %reason, "Draw rejected by moderation");
                Ok(RunOutcome::Rejected { post_id, reason })
            }
        }
    }

    /// 投稿已有 Draw：Verified 则补写 Post，其他状态跳过
    async fn resume(&self, mut post: Post, draw: Draw) -> Result<RunOutcome, WorkflowError> {
        let post_id = post.id().to_string();
        match draw.status() {
            DrawStatus::Verified => {
                post.update_content(draw.result())?;
                post.mark_ready()?;
                self.posts.update(&post).await?;

                tracing::warn!(post_id = %post_id, "Promoted post from existing verified draw");
                Ok(RunOutcome::Healed { post_id })
            }
            DrawStatus::Rejected | DrawStatus::Pending => {
                tracing::debug!(post_id = %post_id, status = %draw.status(), "Post parked");
                Ok(RunOutcome::Parked { post_id })
            }
        }
    }

    async fn format(&self, raw: &str, cancel: &CancellationToken) -> Result<String, WorkflowError> {
        if cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            result = tokio::time::timeout(self.format_timeout, self.formatter.format(raw)) => result,
        };

        let text = match result {
            Err(_) => Err(FormatterError::Timeout(self.format_timeout)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(text)) if text.trim().is_empty() => Err(FormatterError::EmptyOutput),
            Ok(Ok(text)) => Ok(text.trim().to_string()),
        };
        text.map_err(|e| {
            tracing::warn!(provider = self.formatter.provider(), error = %e, "Formatter call failed");
            WorkflowError::FormatterUnavailable(e)
        })
    }
}
