//! Event Loop Implementation
//!
//! Single-threaded timer queue on a virtual millisecond clock. Time only
//! moves when the owner advances it, so delays are exact and testable.

use std::fmt;
use std::time::Duration;

/// Timer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Timer task
#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due_at: u64,
    task: T,
}

/// Event loop carrying task payloads of type `T`
#[derive(Debug)]
pub struct EventLoop<T> {
    /// Pending timers
    timers: Vec<Timer<T>>,
    /// Next timer ID
    next_timer_id: u64,
    /// Current timestamp (ms)
    current_time: u64,
}

impl<T> Default for EventLoop<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_timer_id: 1,
            current_time: 0,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl<T> EventLoop<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time (ms since loop creation)
    pub fn now_ms(&self) -> u64 {
        self.current_time
    }

    pub fn now(&self) -> Duration {
        Duration::from_millis(self.current_time)
    }

    /// Set a timeout
    pub fn set_timeout(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.timers.push(Timer {
            id,
            due_at: self.current_time.saturating_add(millis(delay)),
            task,
        });
        id
    }

    /// Clear a timeout. Returns whether it was still pending.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the earliest timer
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_at).min()
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock
    /// to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, T)> {
        let idx = self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= until_ms)
            .min_by_key(|(_, t)| (t.due_at, t.id))
            .map(|(i, _)| i)?;

        let timer = self.timers.remove(idx);
        self.current_time = self.current_time.max(timer.due_at);
        Some((timer.id, timer.task))
    }

    /// Move the clock forward without running anything
    pub fn advance_to(&mut self, ms: u64) {
        self.current_time = self.current_time.max(ms);
    }

    /// Check if there's pending work
    pub fn has_pending_work(&self) -> bool {
        !self.timers.is_empty()
    }
}
