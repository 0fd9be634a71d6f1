//! Timer queue for the tick scheduler
//!
//! Orders task ids by the tick they are due on. Entries are not removed on
//! cancellation; the scheduler skips ids it no longer tracks.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use super::task::TaskId;

/// A thread-safe queue of `(due tick, task id)` entries.
#[derive(Debug, Default)]
pub struct TimerQueue {
    inner: Mutex<BTreeSet<(u64, TaskId)>>,
}

impl TimerQueue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` to become due at `due_tick`.
    #[inline]
    pub fn push(
        &self,
        due_tick: u64,
        id: TaskId,
    ) {
        self.inner.lock().insert((due_tick, id));
    }

    /// Remove every entry due at or before `now`, earliest first.
    ///
    /// Entries due on the same tick come out in submission (id) order.
    pub fn pop_due(
        &self,
        now: u64,
    ) -> Vec<(u64, TaskId)> {
        let mut inner = self.inner.lock();
        let later = inner.split_off(&(now.saturating_add(1), TaskId(0)));
        let due = std::mem::replace(&mut *inner, later);
        due.into_iter().collect()
    }

    /// Earliest due tick, if any.
    #[inline]
    pub fn next_due(&self) -> Option<u64> {
        self.inner.lock().first().map(|(due, _)| *due)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[inline]
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
