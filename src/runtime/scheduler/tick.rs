//! Reference host scheduler driven by explicit ticks.
//!
//! The embedding engine calls [`TickScheduler::tick`] once per engine step.
//! Cooperative tasks due on that tick run inline, on the calling thread, in
//! due order; parallel tasks are handed to a rayon pool. Finished parallel
//! runs report back over a channel and are rescheduled on the next tick, so a
//! repeating task is never dispatched while its previous run is in flight.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use super::host::{HostScheduler, SchedulerError, Work};
use super::queue::TimerQueue;
use super::task::{Affinity, TaskHandle, TaskId, TaskIdGenerator, TaskSpec};
use super::{SchedulerConfig, SchedulerStats};

/// A task as tracked by the tick scheduler.
struct ScheduledTask {
    handle: TaskHandle,
    work: Mutex<Work>,
}

/// Result of a parallel run, sent back to the tick thread.
#[derive(Debug)]
struct RunOutcome {
    id: TaskId,
    next_due: Option<u64>,
}

/// Counts parallel runs that have been dispatched but not finished.
#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn enter(&self) {
        *self.count.lock() += 1;
    }

    fn exit(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Tick-driven host scheduler.
pub struct TickScheduler {
    config: SchedulerConfig,
    current_tick: AtomicU64,
    ids: TaskIdGenerator,
    /// Live tasks; an id leaves this map when cancelled or finished.
    tasks: Mutex<HashMap<TaskId, Arc<ScheduledTask>>>,
    timers: TimerQueue,
    /// Serializes ticks so cooperative work never overlaps.
    tick_lock: Mutex<()>,
    pool: rayon::ThreadPool,
    in_flight: Arc<InFlight>,
    finished_tx: Sender<RunOutcome>,
    finished_rx: Receiver<RunOutcome>,
    stats: Arc<SchedulerStats>,
    running: AtomicBool,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("config", &self.config)
            .field("current_tick", &self.current_tick())
            .field("live_tasks", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl TickScheduler {
    /// Create a tick scheduler with default config.
    #[inline]
    pub fn new() -> Result<Self, SchedulerError> {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a tick scheduler with custom configuration.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let prefix = config.thread_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.async_workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| SchedulerError::WorkerPool(e.to_string()))?;
        let (finished_tx, finished_rx) = channel::unbounded();

        debug!(workers = pool.current_num_threads(), "tick scheduler started");

        Ok(Self {
            config,
            current_tick: AtomicU64::new(0),
            ids: TaskIdGenerator::new(),
            tasks: Mutex::new(HashMap::new()),
            timers: TimerQueue::new(),
            tick_lock: Mutex::new(()),
            pool,
            in_flight: Arc::new(InFlight::default()),
            finished_tx,
            finished_rx,
            stats: Arc::new(SchedulerStats::default()),
            running: AtomicBool::new(true),
        })
    }

    /// The last tick that was started (0 before the first tick).
    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::SeqCst)
    }

    /// Advance one tick and run everything due on it.
    ///
    /// Cooperative task bodies run on the calling thread before this returns.
    /// Must not be called from inside a task body.
    pub fn tick(&self) -> u64 {
        let _guard = self.tick_lock.lock();
        let now = self.current_tick.fetch_add(1, Ordering::SeqCst) + 1;
        self.drain_finished();

        let due = self.timers.pop_due(now);
        trace!(tick = now, due = due.len(), "tick");

        for (_, id) in due {
            let Some(task) = self.tasks.lock().get(&id).cloned() else {
                continue;
            };
            match task.handle.spec().affinity {
                Affinity::Cooperative => {
                    let next_due = run_task(&task, now, &self.stats);
                    self.settle(id, next_due);
                }
                Affinity::Parallel => self.dispatch(task, now),
            }
        }

        now
    }

    /// Run `ticks` ticks back to back; returns the last tick number.
    pub fn advance(
        &self,
        ticks: u64,
    ) -> u64 {
        let mut last = self.current_tick();
        for _ in 0..ticks {
            last = self.tick();
        }
        last
    }

    /// Block until every dispatched parallel run has finished.
    ///
    /// Must not be called from inside a parallel task body.
    pub fn quiesce(&self) {
        self.in_flight.wait_idle();
    }

    /// Number of live tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    #[inline]
    pub fn stats(&self) -> &Arc<SchedulerStats> {
        &self.stats
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting work and complete every remaining task.
    ///
    /// Waits for in-flight parallel runs to return.
    pub fn shutdown(&self) {
        let drained: Vec<Arc<ScheduledTask>> = {
            let mut tasks = self.tasks.lock();
            self.running.store(false, Ordering::SeqCst);
            tasks.drain().map(|(_, task)| task).collect()
        };
        self.timers.clear();
        for task in &drained {
            task.handle.complete();
        }
        debug!(completed = drained.len(), "tick scheduler shut down");
        drop(drained);
        self.quiesce();
    }

    /// Hand a parallel task to the pool.
    fn dispatch(
        &self,
        task: Arc<ScheduledTask>,
        now: u64,
    ) {
        let stats = self.stats.clone();
        let finished_tx = self.finished_tx.clone();
        let in_flight = self.in_flight.clone();

        in_flight.enter();
        self.pool.spawn(move || {
            let next_due = run_task(&task, now, &stats);
            // The receiver only goes away with the scheduler itself.
            let _ = finished_tx.send(RunOutcome {
                id: task.handle.id(),
                next_due,
            });
            drop(task);
            in_flight.exit();
        });
    }

    /// Apply parallel run outcomes reported since the last tick.
    fn drain_finished(&self) {
        for outcome in self.finished_rx.try_iter() {
            self.settle(outcome.id, outcome.next_due);
        }
    }

    /// Requeue a repeating task or forget a finished one.
    fn settle(
        &self,
        id: TaskId,
        next_due: Option<u64>,
    ) {
        match next_due {
            Some(due) => {
                if self.tasks.lock().contains_key(&id) {
                    self.timers.push(due, id);
                }
            }
            None => {
                // Dropped outside the lock: work may hold the last reference
                // to this scheduler.
                let finished = self.tasks.lock().remove(&id);
                drop(finished);
            }
        }
    }
}

/// Run one task body. Returns the next due tick if the task repeats.
fn run_task(
    task: &ScheduledTask,
    now: u64,
    stats: &SchedulerStats,
) -> Option<u64> {
    if !task.handle.begin_run() {
        return None;
    }
    stats.record_run();

    let result = {
        let mut work = task.work.lock();
        panic::catch_unwind(AssertUnwindSafe(|| (*work)()))
    };
    if result.is_err() {
        stats.record_panic();
        error!(task = %task.handle.id(), "task body panicked");
    }

    if task.handle.end_run() {
        task.handle.spec().period_ticks().map(|period| now + period)
    } else {
        None
    }
}

impl HostScheduler for TickScheduler {
    fn submit(
        &self,
        spec: TaskSpec,
        work: Work,
    ) -> Result<TaskHandle, SchedulerError> {
        let mut tasks = self.tasks.lock();
        if !self.is_running() {
            return Err(SchedulerError::ShutDown);
        }

        let id = self.ids.next();
        let handle = TaskHandle::new(id, spec);
        let due = self.current_tick() + spec.delay_ticks.max(1);
        tasks.insert(
            id,
            Arc::new(ScheduledTask {
                handle: handle.clone(),
                work: Mutex::new(work),
            }),
        );
        drop(tasks);

        self.timers.push(due, id);
        self.stats.record_submitted();
        debug!(task = %id, ?spec, due, "task submitted");

        Ok(handle)
    }

    fn cancel(
        &self,
        id: TaskId,
    ) -> bool {
        let Some(task) = self.tasks.lock().remove(&id) else {
            return false;
        };
        let cancelled = task.handle.cancel();
        if cancelled {
            self.stats.record_cancelled();
            debug!(task = %id, "task cancelled");
        }
        cancelled
    }

    fn is_active(
        &self,
        id: TaskId,
    ) -> bool {
        self.tasks
            .lock()
            .get(&id)
            .is_some_and(|task| !task.handle.is_finished())
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}
