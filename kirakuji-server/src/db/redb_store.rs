//! redb-based document store for posts and draws
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `posts` | `post_id` | JSON `PostRecord` |
//! | `draws` | `post_id` | JSON `DrawRecord` |
//!
//! Every write is a single write transaction; redb serializes writers, so the
//! existence check in `create` and the insert are atomic.
//!
//! Scans skip records that fail to decode; point lookups report them as
//! [`StoreError::Corrupt`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::{Draw, DrawStatus, Post, PostStatus};

use super::{DrawStore, PostStore, StoreError, StoreResult, rotate_pending};

/// key = post_id, value = JSON-serialized PostRecord
const POSTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("posts");

/// key = post_id, value = JSON-serialized DrawRecord
const DRAWS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("draws");

macro_rules! unavailable_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Unavailable(e.to_string())
                }
            }
        )*
    };
}

unavailable_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

#[derive(Debug, Serialize, Deserialize)]
struct PostRecord {
    id: String,
    content: String,
    status: String,
}

impl From<&Post> for PostRecord {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id().to_string(),
            content: post.content().to_string(),
            status: post.status().as_str().to_string(),
        }
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = StoreError;

    fn try_from(record: PostRecord) -> Result<Self, Self::Error> {
        Ok(Post::restore(record.id, record.content, &record.status)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DrawRecord {
    post_id: String,
    result: String,
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
}

impl From<&Draw> for DrawRecord {
    fn from(draw: &Draw) -> Self {
        Self {
            post_id: draw.post_id().to_string(),
            result: draw.result().to_string(),
            status: draw.status().as_str().to_string(),
            rejection_reason: draw.rejection_reason().map(String::from),
        }
    }
}

impl TryFrom<DrawRecord> for Draw {
    type Error = StoreError;

    fn try_from(record: DrawRecord) -> Result<Self, Self::Error> {
        Ok(Draw::restore(
            record.post_id,
            record.result,
            &record.status,
            record.rejection_reason,
        )?)
    }
}

fn decode_post(bytes: &[u8]) -> StoreResult<Post> {
    serde_json::from_slice::<PostRecord>(bytes)?.try_into()
}

fn decode_draw(bytes: &[u8]) -> StoreResult<Draw> {
    serde_json::from_slice::<DrawRecord>(bytes)?.try_into()
}

/// Post / Draw storage backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    pending_cursor: Arc<Mutex<Option<String>>>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(POSTS_TABLE)?;
            let _ = write_txn.open_table(DRAWS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            pending_cursor: Arc::new(Mutex::new(None)),
        })
    }

    fn pending_posts(&self) -> StoreResult<Vec<Post>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS_TABLE)?;

        let mut pending = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            match decode_post(value.value()) {
                Ok(post) if post.status() == PostStatus::Pending => pending.push(post),
                Ok(_) => {}
                Err(e) => tracing::warn!(post_id = %key.value(), error = %e, "Skipping unreadable post record"),
            }
        }
        Ok(pending)
    }
}

#[async_trait]
impl PostStore for RedbStore {
    async fn create(&self, post: &Post) -> StoreResult<()> {
        let value = serde_json::to_vec(&PostRecord::from(post))?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(POSTS_TABLE)?;
            if table.get(post.id())?.is_some() {
                return Err(StoreError::AlreadyExists(post.id().to_string()));
            }
            table.insert(post.id(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn find_pending(&self) -> StoreResult<Option<Post>> {
        let pending = self.pending_posts()?;
        let mut cursor = self.pending_cursor.lock();
        let picked = rotate_pending(pending, cursor.as_deref());
        if let Some(post) = &picked {
            *cursor = Some(post.id().to_string());
        }
        Ok(picked)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Post>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(decode_post(value.value())?)),
            None => Ok(None),
        }
    }

    async fn update(&self, post: &Post) -> StoreResult<()> {
        let value = serde_json::to_vec(&PostRecord::from(post))?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(POSTS_TABLE)?;
            if table.get(post.id())?.is_none() {
                return Err(StoreError::NotFound(post.id().to_string()));
            }
            table.insert(post.id(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl DrawStore for RedbStore {
    async fn create(&self, draw: &Draw) -> StoreResult<()> {
        let value = serde_json::to_vec(&DrawRecord::from(draw))?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DRAWS_TABLE)?;
            if table.get(draw.post_id())?.is_some() {
                return Err(StoreError::AlreadyExists(draw.post_id().to_string()));
            }
            table.insert(draw.post_id(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn get_by_post_id(&self, post_id: &str) -> StoreResult<Draw> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAWS_TABLE)?;

        match table.get(post_id)? {
            Some(value) => decode_draw(value.value()),
            None => Err(StoreError::NotFound(post_id.to_string())),
        }
    }

    async fn list_verified(&self) -> StoreResult<Vec<Draw>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAWS_TABLE)?;

        let mut verified = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            match decode_draw(value.value()) {
                Ok(draw) if draw.status() == DrawStatus::Verified => verified.push(draw),
                Ok(_) => {}
                Err(e) => tracing::warn!(post_id = %key.value(), error = %e, "Skipping unreadable draw record"),
            }
        }
        Ok(verified)
    }
}
