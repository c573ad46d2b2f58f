//! Domain errors for the Post / Draw aggregates
//!
//! These are data-integrity errors: callers surface them unchanged and never
//! retry them.

use thiserror::Error;

/// Validation and state-machine errors raised by [`Post`](crate::models::Post)
/// and [`Draw`](crate::models::Draw).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Post id is blank
    #[error("post id must not be empty")]
    EmptyId,

    /// Post content is blank after trimming
    #[error("post content must not be empty")]
    EmptyContent,

    /// Draw result is blank after trimming
    #[error("draw result must not be empty")]
    EmptyResult,

    /// Rejection reason is blank after trimming
    #[error("rejection reason must not be empty")]
    EmptyReason,

    /// Stored status string is not a known value
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Requested transition is not allowed from the current status
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Draw requested from a Post that has not reached Ready
    #[error("post {0} is not ready")]
    PostNotReady(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
