//! Script-space task handle

use std::sync::{Arc, Weak};

use super::context::ScriptContext;
use super::op::SchedulerOp;
use crate::runtime::scheduler::{Affinity, HostScheduler, TaskHandle, TaskId, TaskState};
use crate::runtime::value::{Arity, NativeFunction, ScriptValue};

/// The task value returned to scripts.
///
/// Holds the host only weakly: a task body may capture its own handle, and
/// the host owns task bodies.
#[derive(Clone)]
pub struct ScriptTask {
    handle: TaskHandle,
    op: SchedulerOp,
    owner: Arc<str>,
    host: Weak<dyn HostScheduler>,
    context: Weak<ScriptContext>,
}

impl ScriptTask {
    pub(crate) fn new(
        handle: TaskHandle,
        op: SchedulerOp,
        context: &Arc<ScriptContext>,
    ) -> Self {
        Self {
            handle,
            op,
            owner: context.name_arc(),
            host: Arc::downgrade(context.host()),
            context: Arc::downgrade(context),
        }
    }

    #[inline]
    pub fn task_id(&self) -> TaskId {
        self.handle.id()
    }

    /// The operation that created this task.
    #[inline]
    pub fn op(&self) -> SchedulerOp {
        self.op
    }

    /// Name of the owning script.
    #[inline]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.handle.state()
    }

    #[inline]
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Runs on the tick thread.
    #[inline]
    pub fn is_sync(&self) -> bool {
        self.handle.spec().affinity == Affinity::Cooperative
    }

    /// Cancel this task. Safe to call any number of times.
    ///
    /// Returns `true` only for the call that actually cancelled a live task.
    pub fn cancel(&self) -> bool {
        let id = self.task_id();
        let by_host = self.host.upgrade().is_some_and(|host| host.cancel(id));
        let cancelled = by_host || self.handle.cancel();
        if let Some(context) = self.context.upgrade() {
            context.unregister(id);
        }
        cancelled
    }

    /// Member lookup for script field access (`task.taskId`, `task.cancel()`).
    pub fn get(
        &self,
        member: &str,
    ) -> Option<ScriptValue> {
        let value = match member {
            "taskId" => ScriptValue::Int(self.task_id().inner() as i64),
            "owner" => ScriptValue::from(self.owner()),
            "isSync" => ScriptValue::Bool(self.is_sync()),
            "isCancelled" => ScriptValue::Bool(self.is_cancelled()),
            "cancel" => {
                let task = self.clone();
                NativeFunction::new("cancel", Arity::Variadic, move |_| {
                    Ok(ScriptValue::Bool(task.cancel()))
                })
                .into_value()
            }
            _ => return None,
        };
        Some(value)
    }
}

impl PartialEq for ScriptTask {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.handle == other.handle
    }
}

impl std::fmt::Debug for ScriptTask {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ScriptTask")
            .field("id", &self.task_id())
            .field("op", &self.op)
            .field("owner", &self.owner)
            .field("state", &self.state())
            .finish()
    }
}
