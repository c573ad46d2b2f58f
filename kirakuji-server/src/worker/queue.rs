//! 整形任务队列
//!
//! 进程内有界 mpsc 通道，按 post_id 去重：同一 post_id 在被消费之前
//! 只能登记一次。

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("format job already scheduled: {0}")]
    AlreadyScheduled(String),

    #[error("job queue closed")]
    Closed,
}

/// 任务队列发送端 (可克隆)
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<String>,
    queued: Arc<Mutex<HashSet<String>>>,
    receiver: Arc<Mutex<Option<JobReceiver>>>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("queued", &self.queued.lock().len())
            .finish_non_exhaustive()
    }
}

/// 任务队列接收端，由 Worker 独占
pub struct JobReceiver {
    rx: mpsc::Receiver<String>,
    queued: Arc<Mutex<HashSet<String>>>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queued = Arc::new(Mutex::new(HashSet::new()));
        let receiver = JobReceiver {
            rx,
            queued: queued.clone(),
        };
        Self {
            tx,
            queued,
            receiver: Arc::new(Mutex::new(Some(receiver))),
        }
    }

    /// 登记整形任务；队列满时等待空位
    pub async fn enqueue(&self, post_id: &str) -> Result<(), QueueError> {
        if !self.queued.lock().insert(post_id.to_string()) {
            return Err(QueueError::AlreadyScheduled(post_id.to_string()));
        }
        if self.tx.send(post_id.to_string()).await.is_err() {
            self.queued.lock().remove(post_id);
            return Err(QueueError::Closed);
        }
        tracing::debug!(post_id = %post_id, "Format job enqueued");
        Ok(())
    }

    /// 取走接收端，只能成功一次
    pub fn take_receiver(&self) -> Option<JobReceiver> {
        self.receiver.lock().take()
    }

    /// 已登记但尚未被消费的任务数
    pub fn len(&self) -> usize {
        self.queued.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobReceiver {
    /// 等待下一个任务；所有发送端关闭后返回 None
    pub async fn recv(&mut self) -> Option<String> {
        let post_id = self.rx.recv().await?;
        self.queued.lock().remove(&post_id);
        Some(post_id)
    }
}
