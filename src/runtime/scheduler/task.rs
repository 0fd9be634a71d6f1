//! Task definitions shared by hosts and the script bridge.
//!
//! A [`TaskHandle`] is the host's receipt for one submitted unit of work.
//! Its state lives in an atomic cell so that cancellation can be requested
//! from any thread without blocking an in-flight execution.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Unique task identifier, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl From<TaskId> for u64 {
    fn from(val: TaskId) -> Self {
        val.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Task lifecycle state.
///
/// ```text
/// Scheduled -> Running -> Completed          (one-shot)
/// Scheduled -> Running -> Scheduled -> ...   (repeating)
/// Scheduled | Running -> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for its next due tick.
    Scheduled,
    /// Body is executing.
    Running,
    /// Finished naturally (one-shot) or host shut down.
    Completed,
    /// Cancelled before or between runs.
    Cancelled,
}

impl TaskState {
    /// Convert from u8 (for atomic storage).
    #[inline]
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => TaskState::Scheduled,
            1 => TaskState::Running,
            2 => TaskState::Completed,
            _ => TaskState::Cancelled,
        }
    }

    /// Convert to u8 (for atomic storage).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            TaskState::Scheduled => 0,
            TaskState::Running => 1,
            TaskState::Completed => 2,
            TaskState::Cancelled => 3,
        }
    }

    /// Whether the task will never run again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }
}

/// Where a task executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affinity {
    /// On the engine's single tick thread, serialized with all other tick work.
    Cooperative,
    /// On the worker pool, possibly concurrent with ticks and other parallel tasks.
    Parallel,
}

/// One-shot or repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    OneShot,
    Repeating { period_ticks: u64 },
}

/// Timing and affinity of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskSpec {
    pub affinity: Affinity,
    pub kind: TaskKind,
    /// Ticks before the first execution; 0 means the next tick.
    pub delay_ticks: u64,
}

impl TaskSpec {
    /// One-shot task after `delay_ticks`.
    #[inline]
    pub fn once(
        affinity: Affinity,
        delay_ticks: u64,
    ) -> Self {
        Self {
            affinity,
            kind: TaskKind::OneShot,
            delay_ticks,
        }
    }

    /// Repeating task. A period of 0 is treated as 1.
    #[inline]
    pub fn repeating(
        affinity: Affinity,
        delay_ticks: u64,
        period_ticks: u64,
    ) -> Self {
        Self {
            affinity,
            kind: TaskKind::Repeating {
                period_ticks: period_ticks.max(1),
            },
            delay_ticks,
        }
    }

    /// Period for repeating tasks.
    #[inline]
    pub fn period_ticks(&self) -> Option<u64> {
        match self.kind {
            TaskKind::OneShot => None,
            TaskKind::Repeating { period_ticks } => Some(period_ticks),
        }
    }

    #[inline]
    pub fn is_repeating(&self) -> bool {
        matches!(self.kind, TaskKind::Repeating { .. })
    }
}

/// Shared state behind every clone of a [`TaskHandle`].
#[derive(Debug)]
struct TaskCell {
    id: TaskId,
    spec: TaskSpec,
    state: AtomicU8,
}

/// Host-issued handle for a scheduled task.
///
/// Clones share one state cell. Cancelling through any clone is visible to
/// the host before the next run of the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cell: Arc<TaskCell>,
}

impl TaskHandle {
    /// Create a handle in the `Scheduled` state.
    pub fn new(
        id: TaskId,
        spec: TaskSpec,
    ) -> Self {
        Self {
            cell: Arc::new(TaskCell {
                id,
                spec,
                state: AtomicU8::new(TaskState::Scheduled.as_u8()),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.cell.id
    }

    #[inline]
    pub fn spec(&self) -> TaskSpec {
        self.cell.spec
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.cell.state.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state() == TaskState::Cancelled
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call moved the task to `Cancelled`; cancelling
    /// a task that already completed or was cancelled is a no-op. A running
    /// body is not interrupted: the cancellation takes effect at the boundary
    /// between runs.
    pub fn cancel(&self) -> bool {
        let mut current = self.cell.state.load(Ordering::SeqCst);
        loop {
            if TaskState::from_u8(current).is_terminal() {
                return false;
            }
            match self.cell.state.compare_exchange(
                current,
                TaskState::Cancelled.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// `Scheduled -> Running`. Fails if the task was cancelled or finished.
    pub fn begin_run(&self) -> bool {
        self.transition(TaskState::Scheduled, TaskState::Running)
    }

    /// `Running -> Scheduled` (repeating) or `Running -> Completed` (one-shot).
    ///
    /// Returns `false` if the task was cancelled while running.
    pub fn end_run(&self) -> bool {
        let next = if self.cell.spec.is_repeating() {
            TaskState::Scheduled
        } else {
            TaskState::Completed
        };
        self.transition(TaskState::Running, next)
    }

    /// Move a live task to `Completed` (host shutdown).
    pub fn complete(&self) -> bool {
        self.transition(TaskState::Scheduled, TaskState::Completed)
            || self.transition(TaskState::Running, TaskState::Completed)
    }

    fn transition(
        &self,
        from: TaskState,
        to: TaskState,
    ) -> bool {
        self.cell
            .state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl PartialEq for TaskHandle {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for TaskHandle {}

/// Thread-safe generator for task IDs. IDs start at 1 and are never reused.
#[derive(Debug)]
pub struct TaskIdGenerator {
    next_id: AtomicU64,
}

impl TaskIdGenerator {
    #[inline]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Generate the next task ID.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
