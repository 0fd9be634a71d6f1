//! Per-script task ownership and script lifecycle hooks
//!
//! Every loaded script gets one [`ScriptContext`]. It records the ids of the
//! tasks the script scheduled; tearing the context down cancels all of them
//! through the host, so no task outlives its script.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hashbrown::HashSet;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::error::{FailureReporter, TracingReporter};
use super::TaskSchedulerBridge;
use crate::runtime::scheduler::{HostScheduler, TaskId};

/// Ownership scope of one loaded script.
pub struct ScriptContext {
    name: Arc<str>,
    host: Arc<dyn HostScheduler>,
    task_ids: Mutex<HashSet<TaskId>>,
    /// Set once under the `task_ids` lock; a closed context accepts no ids.
    closed: AtomicBool,
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ScriptContext")
            .field("name", &self.name)
            .field("tasks", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ScriptContext {
    pub fn new(
        name: impl Into<Arc<str>>,
        host: Arc<dyn HostScheduler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            host,
            task_ids: Mutex::new(HashSet::new()),
            closed: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }

    #[inline]
    pub fn host(&self) -> &Arc<dyn HostScheduler> {
        &self.host
    }

    /// Track `id`. Idempotent.
    ///
    /// Returns `false` if the context is already torn down; the caller then
    /// owns cancelling the task.
    pub fn register(
        &self,
        id: TaskId,
    ) -> bool {
        let mut ids = self.task_ids.lock();
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        ids.insert(id);
        true
    }

    /// Stop tracking `id`. Returns whether it was present.
    pub fn unregister(
        &self,
        id: TaskId,
    ) -> bool {
        self.task_ids.lock().remove(&id)
    }

    #[inline]
    pub fn contains(
        &self,
        id: TaskId,
    ) -> bool {
        self.task_ids.lock().contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.task_ids.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.task_ids.lock().is_empty()
    }

    /// Snapshot of owned ids, ascending.
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.task_ids.lock().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cancel every owned task through the host and clear the set.
    ///
    /// Tasks that already finished are skipped by the host. Returns the
    /// number of ids that were owned.
    pub fn cancel_all(&self) -> usize {
        let ids = std::mem::take(&mut *self.task_ids.lock());
        self.cancel_ids(ids)
    }

    /// Close the context and cancel everything it owns.
    ///
    /// After this returns, registration fails and the set stays empty.
    pub fn close(&self) -> usize {
        let ids = {
            let mut ids = self.task_ids.lock();
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut *ids)
        };
        self.cancel_ids(ids)
    }

    fn cancel_ids(
        &self,
        ids: HashSet<TaskId>,
    ) -> usize {
        let owned = ids.len();
        let mut cancelled = 0;
        for id in ids {
            if self.host.cancel(id) {
                cancelled += 1;
            }
        }
        debug!(script = %self.name, owned, cancelled, "script tasks cancelled");
        owned
    }
}

/// Loaded scripts by name, in load order.
///
/// Hosts call [`on_script_loaded`](Self::on_script_loaded) and
/// [`on_script_unloaded`](Self::on_script_unloaded) explicitly.
pub struct ScriptRegistry {
    host: Arc<dyn HostScheduler>,
    reporter: Arc<dyn FailureReporter>,
    scripts: RwLock<IndexMap<String, Arc<ScriptContext>>>,
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.names())
            .finish()
    }
}

impl ScriptRegistry {
    pub fn new(host: Arc<dyn HostScheduler>) -> Self {
        Self::with_reporter(host, Arc::new(TracingReporter))
    }

    pub fn with_reporter(
        host: Arc<dyn HostScheduler>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self {
            host,
            reporter,
            scripts: RwLock::new(IndexMap::new()),
        }
    }

    #[inline]
    pub fn host(&self) -> &Arc<dyn HostScheduler> {
        &self.host
    }

    /// Create the context for a freshly loaded script.
    ///
    /// A script already loaded under `name` is torn down first (reload).
    pub fn on_script_loaded(
        &self,
        name: &str,
    ) -> Arc<ScriptContext> {
        let context = ScriptContext::new(name, self.host.clone());
        let replaced = self
            .scripts
            .write()
            .insert(name.to_string(), context.clone());

        if let Some(old) = replaced {
            let cancelled = old.close();
            info!(script = name, cancelled, "script reloaded");
        } else {
            info!(script = name, "script loaded");
        }
        context
    }

    /// Tear down `context`, cancelling every task it still owns.
    pub fn on_script_unloaded(
        &self,
        context: &Arc<ScriptContext>,
    ) -> usize {
        {
            let mut scripts = self.scripts.write();
            let current = scripts
                .get(context.name())
                .is_some_and(|c| Arc::ptr_eq(c, context));
            if current {
                scripts.shift_remove(context.name());
            }
        }
        let cancelled = context.close();
        info!(script = context.name(), cancelled, "script unloaded");
        cancelled
    }

    /// Unload by name. `None` if no such script is loaded.
    pub fn unload(
        &self,
        name: &str,
    ) -> Option<usize> {
        let context = self.get(name)?;
        Some(self.on_script_unloaded(&context))
    }

    /// Unload every script in load order. Returns the total tasks cancelled.
    pub fn unload_all(&self) -> usize {
        let contexts: Vec<Arc<ScriptContext>> =
            self.scripts.write().drain(..).map(|(_, c)| c).collect();
        let mut total = 0;
        for context in contexts {
            let cancelled = context.close();
            info!(script = context.name(), cancelled, "script unloaded");
            total += cancelled;
        }
        total
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Arc<ScriptContext>> {
        self.scripts.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.scripts.read().keys().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }

    /// Scheduler object for `context`, reporting to this registry's reporter.
    pub fn bridge(
        &self,
        context: &Arc<ScriptContext>,
    ) -> TaskSchedulerBridge {
        TaskSchedulerBridge::with_reporter(context.clone(), self.reporter.clone())
    }
}
