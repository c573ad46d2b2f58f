//! Post Model
//!
//! A raw anonymous submission waiting to be rewritten. Status only moves
//! forward: `Pending -> Ready`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult, is_blank};

/// Post status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Pending,
    Ready,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PostStatus::Pending),
            "ready" => Ok(PostStatus::Ready),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Post aggregate
///
/// Fields are private so every mutation goes through the state machine.
/// `Clone` produces an independent copy, which is what stores hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    id: String,
    content: String,
    status: PostStatus,
}

impl Post {
    /// Create a new Pending post
    pub fn create(id: impl Into<String>, content: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        let content = content.into();
        if is_blank(&id) {
            return Err(DomainError::EmptyId);
        }
        if is_blank(&content) {
            return Err(DomainError::EmptyContent);
        }
        Ok(Self {
            id,
            content,
            status: PostStatus::Pending,
        })
    }

    /// Rebuild a post from its stored form
    pub fn restore(
        id: impl Into<String>,
        content: impl Into<String>,
        status: &str,
    ) -> DomainResult<Self> {
        let status = status.parse::<PostStatus>()?;
        let id = id.into();
        let content = content.into();
        if is_blank(&id) {
            return Err(DomainError::EmptyId);
        }
        if is_blank(&content) {
            return Err(DomainError::EmptyContent);
        }
        Ok(Self { id, content, status })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == PostStatus::Ready
    }

    /// Replace the content (the rewritten text lands here before promotion)
    pub fn update_content(&mut self, text: impl Into<String>) -> DomainResult<()> {
        let text = text.into();
        if is_blank(&text) {
            return Err(DomainError::EmptyContent);
        }
        self.content = text;
        Ok(())
    }

    /// `Pending -> Ready`. A second call fails instead of being a no-op.
    pub fn mark_ready(&mut self) -> DomainResult<()> {
        if self.status != PostStatus::Pending {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.as_str(),
                to: PostStatus::Ready.as_str(),
            });
        }
        self.status = PostStatus::Ready;
        Ok(())
    }
}
