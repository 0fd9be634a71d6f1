//! The six scheduler operations exposed to scripts

use crate::runtime::scheduler::Affinity;

/// One script-facing scheduler operation.
///
/// Timing comes from the name (`run*` next tick, `*Later*` delayed,
/// `*Timer*` repeating), affinity from the `Async` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerOp {
    Run,
    RunAsync,
    RunLater,
    RunLaterAsync,
    RunTimer,
    RunTimerAsync,
}

impl SchedulerOp {
    pub const ALL: [SchedulerOp; 6] = [
        SchedulerOp::Run,
        SchedulerOp::RunAsync,
        SchedulerOp::RunLater,
        SchedulerOp::RunLaterAsync,
        SchedulerOp::RunTimer,
        SchedulerOp::RunTimerAsync,
    ];

    /// Member name seen by scripts.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerOp::Run => "run",
            SchedulerOp::RunAsync => "runAsync",
            SchedulerOp::RunLater => "runLater",
            SchedulerOp::RunLaterAsync => "runLaterAsync",
            SchedulerOp::RunTimer => "runTimer",
            SchedulerOp::RunTimerAsync => "runTimerAsync",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn affinity(&self) -> Affinity {
        match self {
            SchedulerOp::Run | SchedulerOp::RunLater | SchedulerOp::RunTimer => {
                Affinity::Cooperative
            }
            SchedulerOp::RunAsync | SchedulerOp::RunLaterAsync | SchedulerOp::RunTimerAsync => {
                Affinity::Parallel
            }
        }
    }

    /// Exact positional argument count.
    pub fn arg_count(&self) -> usize {
        match self {
            SchedulerOp::Run | SchedulerOp::RunAsync => 1,
            SchedulerOp::RunLater | SchedulerOp::RunLaterAsync => 2,
            SchedulerOp::RunTimer | SchedulerOp::RunTimerAsync => 3,
        }
    }

    /// Parameter list used in arity errors.
    pub fn usage(&self) -> &'static str {
        match self.arg_count() {
            1 => "callback",
            2 => "callback, delay",
            _ => "callback, delay, period",
        }
    }

    #[inline]
    pub fn is_repeating(&self) -> bool {
        self.arg_count() == 3
    }
}

impl std::fmt::Display for SchedulerOp {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
