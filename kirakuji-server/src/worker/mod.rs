//! 整形流水线
//!
//! - [`orchestrator`] - 单次整形 → 审核编排
//! - [`queue`] - 进程内整形任务队列
//! - [`driver`] - 后台 Worker (轮询 / 队列)

pub mod driver;
pub mod orchestrator;
pub mod queue;

pub use driver::{Trigger, Worker};
pub use orchestrator::{Orchestrator, RunOutcome, WorkflowError};
pub use queue::{JobQueue, JobReceiver, QueueError};
