//! Data models
//!
//! Post and Draw aggregates. Both keep their fields private; storage goes
//! through `restore`, everything else through the state machine methods.

pub mod draw;
pub mod post;

// Re-exports
pub use draw::*;
pub use post::*;
