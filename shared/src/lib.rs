//! Shared types for Kirakuji
//!
//! Domain aggregates, domain errors and the HTTP wire types used by the
//! server and its clients.

pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use error::{DomainError, DomainResult};
pub use models::{Draw, DrawStatus, Post, PostStatus};
pub use serde::{Deserialize, Serialize};
