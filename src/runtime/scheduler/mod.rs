//! Host-side task scheduling
//!
//! This module defines what the bridge needs from a host engine
//! ([`HostScheduler`]) and ships [`TickScheduler`], a reference host with a
//! cooperative tick queue and a parallel worker pool.

pub mod host;
pub mod queue;
pub mod task;
pub mod tick;

pub use host::{HostScheduler, SchedulerError, Work};
pub use queue::TimerQueue;
pub use task::{Affinity, TaskHandle, TaskId, TaskIdGenerator, TaskKind, TaskSpec, TaskState};
pub use tick::TickScheduler;

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads for parallel tasks (0 = one per CPU).
    pub async_workers: usize,
    /// Worker thread name prefix.
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            async_workers: 0,
            thread_name: "tick-async".to_string(),
        }
    }
}

/// Scheduler statistics.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Total tasks accepted.
    pub tasks_submitted: AtomicUsize,
    /// Total task bodies executed (each repeat counts).
    pub runs: AtomicUsize,
    /// Total tasks cancelled through the host.
    pub tasks_cancelled: AtomicUsize,
    /// Task bodies that panicked past every other boundary.
    pub panics: AtomicUsize,
}

impl SchedulerStats {
    #[inline]
    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_run(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_cancelled(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests;
