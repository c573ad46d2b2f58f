//! 服务层
//!
//! - [`SubmissionService`] - 投稿受理 (写入 Pending Post + 登记整形任务)

pub mod submission;

pub use submission::{SubmissionService, SubmitError};
