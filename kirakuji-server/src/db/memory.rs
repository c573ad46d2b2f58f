//! 进程内存储
//!
//! `parking_lot::Mutex` 保护有序 map，读出的聚合均为克隆。

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{Draw, Post, PostStatus};

use super::{DrawStore, PostStore, StoreError, StoreResult, rotate_pending};

#[derive(Default)]
struct Inner {
    posts: BTreeMap<String, Post>,
    draws: BTreeMap<String, Draw>,
    /// 上一次 find_pending 返回的 id
    pending_cursor: Option<String>,
}

/// 进程内 Post / Draw 存储
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> usize {
        self.inner.lock().posts.len()
    }

    pub fn draw_count(&self) -> usize {
        self.inner.lock().draws.len()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: &Post) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.posts.contains_key(post.id()) {
            return Err(StoreError::AlreadyExists(post.id().to_string()));
        }
        inner.posts.insert(post.id().to_string(), post.clone());
        Ok(())
    }

    async fn find_pending(&self) -> StoreResult<Option<Post>> {
        let mut inner = self.inner.lock();
        let pending: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.status() == PostStatus::Pending)
            .cloned()
            .collect();
        let picked = rotate_pending(pending, inner.pending_cursor.as_deref());
        if let Some(post) = &picked {
            inner.pending_cursor = Some(post.id().to_string());
        }
        Ok(picked)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Post>> {
        Ok(self.inner.lock().posts.get(id).cloned())
    }

    async fn update(&self, post: &Post) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        match inner.posts.get_mut(post.id()) {
            Some(slot) => {
                *slot = post.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(post.id().to_string())),
        }
    }
}

#[async_trait]
impl DrawStore for MemoryStore {
    async fn create(&self, draw: &Draw) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.draws.contains_key(draw.post_id()) {
            return Err(StoreError::AlreadyExists(draw.post_id().to_string()));
        }
        inner.draws.insert(draw.post_id().to_string(), draw.clone());
        Ok(())
    }

    async fn get_by_post_id(&self, post_id: &str) -> StoreResult<Draw> {
        self.inner
            .lock()
            .draws
            .get(post_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(post_id.to_string()))
    }

    async fn list_verified(&self) -> StoreResult<Vec<Draw>> {
        Ok(self
            .inner
            .lock()
            .draws
            .values()
            .filter(|d| d.is_verified())
            .cloned()
            .collect())
    }
}
