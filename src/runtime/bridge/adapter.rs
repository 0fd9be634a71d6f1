//! Script callable -> host work adapter
//!
//! The host runs zero-argument work. A callable declaring exactly one
//! parameter is handed its own task handle instead, which lets a repeating
//! task cancel itself.
//!
//! The host drops the work once the task is finished, cancelled or shut
//! down; dropping the last reference to the adapter unregisters its task.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use super::context::ScriptContext;
use super::error::{CallbackFailure, FailureReporter};
use super::op::SchedulerOp;
use super::task::ScriptTask;
use crate::runtime::scheduler::Work;
use crate::runtime::value::{ScriptFunction, ScriptValue};

/// Wraps one script callable for execution by the host.
pub struct CallbackAdapter {
    callable: Arc<dyn ScriptFunction>,
    passes_handle: bool,
    op: SchedulerOp,
    script: Arc<str>,
    task: OnceCell<ScriptTask>,
    context: Weak<ScriptContext>,
    reporter: Arc<dyn FailureReporter>,
}

impl CallbackAdapter {
    pub fn new(
        callable: Arc<dyn ScriptFunction>,
        op: SchedulerOp,
        context: &Arc<ScriptContext>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        let passes_handle = callable.declared_arity().receives_handle();
        Self {
            callable,
            passes_handle,
            op,
            script: context.name_arc(),
            task: OnceCell::new(),
            context: Arc::downgrade(context),
            reporter,
        }
    }

    /// Whether the callable is invoked with its task handle.
    #[inline]
    pub fn passes_handle(&self) -> bool {
        self.passes_handle
    }

    /// Attach the task created for this adapter. Only the first call wins.
    pub fn bind(
        &self,
        task: ScriptTask,
    ) -> bool {
        self.task.set(task).is_ok()
    }

    /// Host work that invokes this adapter.
    pub fn into_work(self: Arc<Self>) -> Work {
        Box::new(move || self.invoke())
    }

    /// Run the callable once inside a failure boundary.
    ///
    /// Blocks until [`bind`](Self::bind) has happened; the bridge binds
    /// immediately after `submit` returns.
    pub fn invoke(&self) {
        let task = self.task.wait();

        let mut args: SmallVec<[ScriptValue; 1]> = SmallVec::new();
        if self.passes_handle {
            args.push(ScriptValue::Task(task.clone()));
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.callable.call(&args))) {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => self.report(task, err.to_string(), false),
            Err(payload) => self.report(task, panic_message(payload.as_ref()), true),
        }

        if !self.op.is_repeating() {
            if let Some(context) = self.context.upgrade() {
                context.unregister(task.task_id());
            }
        }
    }

    fn report(
        &self,
        task: &ScriptTask,
        message: String,
        panicked: bool,
    ) {
        self.reporter.report(&CallbackFailure {
            task: task.task_id(),
            script: self.script.to_string(),
            op: self.op,
            message,
            panicked,
        });
    }
}

impl std::fmt::Debug for CallbackAdapter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("callable", &self.callable.name())
            .field("passes_handle", &self.passes_handle)
            .field("op", &self.op)
            .field("task", &self.task.get().map(|t| t.task_id()))
            .finish()
    }
}

impl Drop for CallbackAdapter {
    fn drop(&mut self) {
        if let (Some(task), Some(context)) = (self.task.get(), self.context.upgrade()) {
            context.unregister(task.task_id());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked".to_string()
    }
}
