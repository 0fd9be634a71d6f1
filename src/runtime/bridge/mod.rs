//! Script scheduler bridge
//!
//! Lets a loaded script schedule callables on the host scheduler and tracks
//! the resulting tasks per script:
//!
//! ```text
//! script call -> validate -> CallbackAdapter -> HostScheduler::submit
//!             -> ScriptContext::register -> ScriptTask back to script
//!
//! script unload -> ScriptContext::close -> HostScheduler::cancel (each id)
//! ```

pub mod adapter;
pub mod context;
pub mod error;
pub mod op;
pub mod task;

pub use adapter::CallbackAdapter;
pub use context::{ScriptContext, ScriptRegistry};
pub use error::{BridgeError, CallbackFailure, FailureReporter, TracingReporter};
pub use op::SchedulerOp;
pub use task::ScriptTask;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::runtime::scheduler::TaskSpec;
use crate::runtime::value::{Arity, NativeFunction, ScriptError, ScriptFunction, ScriptValue};

/// The scheduler object one script sees.
#[derive(Clone)]
pub struct TaskSchedulerBridge {
    context: Arc<ScriptContext>,
    reporter: Arc<dyn FailureReporter>,
}

impl std::fmt::Debug for TaskSchedulerBridge {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TaskSchedulerBridge")
            .field("context", &self.context)
            .finish()
    }
}

impl TaskSchedulerBridge {
    /// Bridge reporting callback failures through `tracing`.
    pub fn new(context: Arc<ScriptContext>) -> Self {
        Self::with_reporter(context, Arc::new(TracingReporter))
    }

    pub fn with_reporter(
        context: Arc<ScriptContext>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self { context, reporter }
    }

    #[inline]
    pub fn context(&self) -> &Arc<ScriptContext> {
        &self.context
    }

    /// `run(callback)`: next tick, on the tick thread.
    pub fn run(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::Run, args)
    }

    /// `runAsync(callback)`: next tick, on the worker pool.
    pub fn run_async(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::RunAsync, args)
    }

    /// `runLater(callback, delay)`
    pub fn run_later(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::RunLater, args)
    }

    /// `runLaterAsync(callback, delay)`
    pub fn run_later_async(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::RunLaterAsync, args)
    }

    /// `runTimer(callback, delay, period)`
    pub fn run_timer(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::RunTimer, args)
    }

    /// `runTimerAsync(callback, delay, period)`
    pub fn run_timer_async(
        &self,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        self.call_op(SchedulerOp::RunTimerAsync, args)
    }

    /// Dispatch by member name.
    pub fn call(
        &self,
        name: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        let op = SchedulerOp::from_name(name).ok_or_else(|| BridgeError::InvalidArgument {
            op: "scheduler",
            message: format!("scheduler has no member '{}'", name),
        })?;
        self.call_op(op, args)
    }

    /// Validate positional arguments, then schedule.
    pub fn call_op(
        &self,
        op: SchedulerOp,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BridgeError> {
        let (callable, spec) = validate(op, args)?;
        self.schedule(op, callable, spec).map(ScriptValue::Task)
    }

    /// Schedule an already validated callable. `spec` must match `op`.
    pub(crate) fn schedule(
        &self,
        op: SchedulerOp,
        callable: Arc<dyn ScriptFunction>,
        spec: TaskSpec,
    ) -> Result<ScriptTask, BridgeError> {
        if self.context.is_closed() {
            return Err(self.unloaded());
        }

        let adapter = Arc::new(CallbackAdapter::new(
            callable,
            op,
            &self.context,
            self.reporter.clone(),
        ));
        let handle = self
            .context
            .host()
            .submit(spec, adapter.clone().into_work())?;
        let task = ScriptTask::new(handle, op, &self.context);

        // Register before binding: the adapter waits for the binding, so a
        // one-shot cannot unregister itself ahead of its registration.
        let registered = self.context.register(task.task_id());
        adapter.bind(task.clone());

        if !registered {
            self.context.host().cancel(task.task_id());
            warn!(
                script = self.context.name(),
                task = %task.task_id(),
                "task submitted during script unload, cancelled"
            );
            return Err(self.unloaded());
        }

        debug!(
            script = self.context.name(),
            op = op.name(),
            task = %task.task_id(),
            passes_handle = adapter.passes_handle(),
            "task scheduled"
        );
        Ok(task)
    }

    /// The six operations as named script members.
    pub fn members(&self) -> Vec<(&'static str, ScriptValue)> {
        SchedulerOp::ALL
            .into_iter()
            .map(|op| {
                let bridge = self.clone();
                let member = NativeFunction::new(op.name(), Arity::Variadic, move |args| {
                    bridge.call_op(op, args).map_err(ScriptError::from)
                });
                (op.name(), member.into_value())
            })
            .collect()
    }

    fn unloaded(&self) -> BridgeError {
        BridgeError::ScriptUnloaded {
            script: self.context.name().to_string(),
        }
    }
}

/// Check argument count and types for `op`.
fn validate(
    op: SchedulerOp,
    args: &[ScriptValue],
) -> Result<(Arc<dyn ScriptFunction>, TaskSpec), BridgeError> {
    if args.len() != op.arg_count() {
        return Err(BridgeError::arity(op));
    }

    let callable = args[0].as_function().cloned().ok_or_else(|| {
        BridgeError::bad_argument(
            op,
            1,
            format!("function expected, got {}", args[0].type_name()),
        )
    })?;

    let ticks = |position: usize| {
        args[position - 1]
            .to_ticks()
            .map_err(|e| BridgeError::bad_argument(op, position, e))
    };

    let affinity = op.affinity();
    let spec = match op.arg_count() {
        1 => TaskSpec::once(affinity, 0),
        2 => TaskSpec::once(affinity, ticks(2)?),
        _ => TaskSpec::repeating(affinity, ticks(2)?, ticks(3)?),
    };

    Ok((callable, spec))
}

#[cfg(test)]
mod tests;
