//! Bridge errors and callback failure reporting

use std::fmt;

use tracing::error;

use super::op::SchedulerOp;
use crate::runtime::scheduler::{SchedulerError, TaskId};

/// Errors raised synchronously by scheduler calls made from script.
///
/// No task exists after any of these errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Wrong argument count, non-callable callback or bad tick count.
    #[error("{message}")]
    InvalidArgument { op: &'static str, message: String },
    /// The host refused the work.
    #[error("scheduler unavailable: {0}")]
    SchedulerUnavailable(#[from] SchedulerError),
    /// The calling script was torn down while the call was in progress.
    #[error("script '{script}' is unloaded")]
    ScriptUnloaded { script: String },
}

impl BridgeError {
    /// Wrong argument count.
    pub fn arity(op: SchedulerOp) -> Self {
        let count = op.arg_count();
        BridgeError::InvalidArgument {
            op: op.name(),
            message: format!(
                "{} expects {} argument{}: {}",
                op.name(),
                count,
                if count == 1 { "" } else { "s" },
                op.usage()
            ),
        }
    }

    /// Bad value at 1-based argument `position`.
    pub fn bad_argument(
        op: SchedulerOp,
        position: usize,
        reason: impl fmt::Display,
    ) -> Self {
        BridgeError::InvalidArgument {
            op: op.name(),
            message: format!("bad argument #{} to '{}' ({})", position, op.name(), reason),
        }
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BridgeError::InvalidArgument { .. })
    }
}

/// An error or panic that escaped a scheduled callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFailure {
    pub task: TaskId,
    pub script: String,
    pub op: SchedulerOp,
    pub message: String,
    /// The callback panicked instead of returning an error.
    pub panicked: bool,
}

impl fmt::Display for CallbackFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let kind = if self.panicked { "panicked" } else { "failed" };
        write!(
            f,
            "{} callback of {} in script '{}' {}: {}",
            self.op.name(),
            self.task,
            self.script,
            kind,
            self.message
        )
    }
}

/// Receives callback failures. Called on whichever thread ran the callback.
pub trait FailureReporter: Send + Sync {
    fn report(
        &self,
        failure: &CallbackFailure,
    );
}

/// Reports failures as `tracing` errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(
        &self,
        failure: &CallbackFailure,
    ) {
        error!(
            script = %failure.script,
            op = failure.op.name(),
            task = failure.task.inner(),
            panicked = failure.panicked,
            "{}",
            failure
        );
    }
}
