//! 投稿受理
//!
//! 校验并写入 Pending Post；配置了任务队列时同时登记整形任务。

use std::sync::Arc;

use shared::{DomainError, Post};
use thiserror::Error;

use crate::db::{PostStore, StoreError};
use crate::worker::{JobQueue, QueueError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("post already exists: {0}")]
    PostAlreadyExists(String),

    #[error("format job already scheduled: {0}")]
    JobAlreadyScheduled(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Queue(QueueError),
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(id) => Self::PostAlreadyExists(id),
            other => Self::Store(other),
        }
    }
}

impl From<QueueError> for SubmitError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::AlreadyScheduled(id) => Self::JobAlreadyScheduled(id),
            other => Self::Queue(other),
        }
    }
}

/// 投稿服务
pub struct SubmissionService {
    posts: Arc<dyn PostStore>,
    jobs: Option<JobQueue>,
}

impl SubmissionService {
    pub fn new(posts: Arc<dyn PostStore>, jobs: Option<JobQueue>) -> Self {
        Self { posts, jobs }
    }

    pub async fn submit(&self, post_id: &str, content: &str) -> Result<Post, SubmitError> {
        let post = Post::create(post_id, content)?;
        self.posts.create(&post).await?;

        if let Some(jobs) = &self.jobs {
            jobs.enqueue(post.id()).await?;
        }

        tracing::info!(post_id = %post.id(), "Post submitted");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use shared::PostStatus;

    #[tokio::test]
    async fn test_submit_creates_pending_post() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store.clone(), None);

        let post = service.submit("p-1", "仕事がつらい").await.unwrap();
        assert_eq!(post.status(), PostStatus::Pending);

        let stored = store.find_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(stored.content(), "仕事がつらい");
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store.clone(), None);

        assert!(matches!(
            service.submit("p-1", "   ").await,
            Err(SubmitError::Validation(DomainError::EmptyContent))
        ));
        assert!(matches!(
            service.submit(" ", "text").await,
            Err(SubmitError::Validation(DomainError::EmptyId))
        ));
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_duplicate_post() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store, None);

        service.submit("p-1", "一回目").await.unwrap();
        assert!(matches!(
            service.submit("p-1", "二回目").await,
            Err(SubmitError::PostAlreadyExists(id)) if id == "p-1"
        ));
    }

    #[tokio::test]
    async fn test_submit_enqueues_job() {
        let store = Arc::new(MemoryStore::new());
        let queue = JobQueue::new(4);
        let mut rx = queue.take_receiver().unwrap();
        let service = SubmissionService::new(store, Some(queue.clone()));

        service.submit("p-1", "眠れない").await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(rx.recv().await.as_deref(), Some("p-1"));
    }

    #[tokio::test]
    async fn test_submit_duplicate_job() {
        let store = Arc::new(MemoryStore::new());
        let queue = JobQueue::new(4);
        let _rx = queue.take_receiver().unwrap();
        queue.enqueue("p-1").await.unwrap();

        let service = SubmissionService::new(store.clone(), Some(queue));
        assert!(matches!(
            service.submit("p-1", "眠れない").await,
            Err(SubmitError::JobAlreadyScheduled(id)) if id == "p-1"
        ));
        // the post itself was stored before the job was refused
        assert_eq!(store.post_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_closed_queue() {
        let store = Arc::new(MemoryStore::new());
        let queue = JobQueue::new(4);
        drop(queue.take_receiver());

        let service = SubmissionService::new(store, Some(queue));
        assert!(matches!(
            service.submit("p-1", "眠れない").await,
            Err(SubmitError::Queue(QueueError::Closed))
        ));
    }
}
