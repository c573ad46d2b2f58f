//! Draw Model
//!
//! A rewritten, moderated fortune tied one-to-one to a [`Post`].
//!
//! ```text
//! Pending ──accepted──▶ Verified   (terminal)
//!    └─────rejected──▶ Rejected   (terminal)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::post::Post;
use crate::error::{DomainError, DomainResult, is_blank};

/// Draw status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrawStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl DrawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawStatus::Pending => "pending",
            DrawStatus::Verified => "verified",
            DrawStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DrawStatus::Pending)
    }
}

impl fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DrawStatus::Pending),
            "verified" => Ok(DrawStatus::Verified),
            "rejected" => Ok(DrawStatus::Rejected),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Draw aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    post_id: String,
    result: String,
    status: DrawStatus,
    rejection_reason: Option<String>,
}

impl Draw {
    /// Create a Pending draw straight from formatter output
    pub fn create(post_id: impl Into<String>, result: impl Into<String>) -> DomainResult<Self> {
        let result = result.into();
        if is_blank(&result) {
            return Err(DomainError::EmptyResult);
        }
        Ok(Self {
            post_id: post_id.into(),
            result,
            status: DrawStatus::Pending,
            rejection_reason: None,
        })
    }

    /// Create a Pending draw for a post that has reached Ready
    pub fn from_post(post: &Post, result: impl Into<String>) -> DomainResult<Self> {
        if !post.is_ready() {
            return Err(DomainError::PostNotReady(post.id().to_string()));
        }
        Self::create(post.id(), result)
    }

    /// Rebuild a draw from its stored form
    pub fn restore(
        post_id: impl Into<String>,
        result: impl Into<String>,
        status: &str,
        rejection_reason: Option<String>,
    ) -> DomainResult<Self> {
        let status = status.parse::<DrawStatus>()?;
        let result = result.into();
        let rejection_reason = match status {
            DrawStatus::Rejected => match rejection_reason {
                Some(reason) if !is_blank(&reason) => Some(reason),
                _ => return Err(DomainError::EmptyReason),
            },
            DrawStatus::Pending | DrawStatus::Verified => {
                if is_blank(&result) {
                    return Err(DomainError::EmptyResult);
                }
                None
            }
        };
        Ok(Self {
            post_id: post_id.into(),
            result,
            status,
            rejection_reason,
        })
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn status(&self) -> DrawStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.status == DrawStatus::Verified
    }

    /// `Pending -> Verified`, clearing any rejection reason
    pub fn mark_verified(&mut self) -> DomainResult<()> {
        self.ensure_pending(DrawStatus::Verified)?;
        self.status = DrawStatus::Verified;
        self.rejection_reason = None;
        Ok(())
    }

    /// `Pending -> Rejected` with a non-blank reason
    pub fn mark_rejected(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = reason.into();
        if is_blank(&reason) {
            return Err(DomainError::EmptyReason);
        }
        self.ensure_pending(DrawStatus::Rejected)?;
        self.status = DrawStatus::Rejected;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    fn ensure_pending(&self, to: DrawStatus) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        Ok(())
    }
}
