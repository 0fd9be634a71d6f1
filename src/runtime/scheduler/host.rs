//! The host engine's scheduler, as seen by the bridge.

use super::task::{TaskHandle, TaskId, TaskSpec};

/// A zero-argument unit of work. Repeating tasks call it once per run.
pub type Work = Box<dyn FnMut() + Send + 'static>;

/// Errors raised by a host when accepting work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The host no longer accepts new work (engine shutting down).
    #[error("scheduler is shut down")]
    ShutDown,
    /// The worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Execution engine that owns the tick thread and the worker pool.
///
/// Implementations must return the handle from [`submit`](Self::submit)
/// before the work can run for the first time, even when the delay is 0:
/// the earliest execution is the next tick, never inside `submit`.
///
/// The work is kept alive until the task is finished or cancelled and
/// dropped afterwards.
pub trait HostScheduler: Send + Sync {
    /// Accept `work` with the given timing and affinity.
    fn submit(
        &self,
        spec: TaskSpec,
        work: Work,
    ) -> Result<TaskHandle, SchedulerError>;

    /// Cancel and forget a task. No-op for unknown or finished ids.
    ///
    /// Returns `true` if a live task was cancelled.
    fn cancel(
        &self,
        id: TaskId,
    ) -> bool;

    /// Whether the host still tracks `id` as a live (not finished) task.
    fn is_active(
        &self,
        id: TaskId,
    ) -> bool;
}
