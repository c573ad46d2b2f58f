//! 存储层
//!
//! Post / Draw 的持久化契约和两种实现：
//!
//! - [`MemoryStore`] - 进程内存储 (开发 / 测试)
//! - [`RedbStore`] - 嵌入式 redb 文档存储
//!
//! 两者都同时实现 [`PostStore`] 和 [`DrawStore`]。返回的聚合都是独立副本，
//! 调用方修改后必须通过 `update` / `create` 写回。

pub mod memory;
pub mod redb_store;

#[cfg(test)]
mod contract;

use async_trait::async_trait;
use shared::{DomainError, Draw, Post};
use thiserror::Error;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// 存储中的记录无法还原为合法聚合
    #[error("stored record is invalid: {0}")]
    Corrupt(#[from] DomainError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 底层存储不可用 (可重试)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Post 存储
#[async_trait]
pub trait PostStore: Send + Sync {
    /// 新建投稿，id 重复时返回 [`StoreError::AlreadyExists`]
    async fn create(&self, post: &Post) -> StoreResult<()>;

    /// 取一条 Pending 投稿
    ///
    /// 按 id 顺序轮转：从上一次返回的 id 之后开始，到末尾后回绕。
    async fn find_pending(&self) -> StoreResult<Option<Post>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Post>>;

    /// 覆盖已有投稿，不存在时返回 [`StoreError::NotFound`]
    async fn update(&self, post: &Post) -> StoreResult<()>;
}

/// Draw 存储
#[async_trait]
pub trait DrawStore: Send + Sync {
    /// 新建抽签结果，同一 post_id 只能有一条
    async fn create(&self, draw: &Draw) -> StoreResult<()>;

    /// 不存在时返回 [`StoreError::NotFound`]
    async fn get_by_post_id(&self, post_id: &str) -> StoreResult<Draw>;

    async fn list_verified(&self) -> StoreResult<Vec<Draw>>;
}

/// 从按 id 升序排列的 Pending 投稿中选出 `cursor` 之后的第一条，没有则回绕到第一条
pub(crate) fn rotate_pending(pending: Vec<Post>, cursor: Option<&str>) -> Option<Post> {
    let start = cursor
        .and_then(|c| pending.iter().position(|p| p.id() > c))
        .unwrap_or(0);
    pending.into_iter().nth(start)
}
