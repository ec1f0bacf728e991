//! Change debouncing and the cloud-originated-update guard.
//!
//! Callers pass the current time into every method, so tests drive the
//! timers with virtual time instead of sleeping.

/// A restartable quiet-period timer.
///
/// `reset` arms (or re-arms) the deadline; `take_due` reports and disarms
/// it once the quiet period has elapsed without another reset.
#[derive(Debug)]
pub struct DebounceTimer {
    quiet_ms: i64,
    deadline: Option<i64>,
}

impl DebounceTimer {
    pub fn new(quiet_ms: i64) -> Self {
        Self {
            quiet_ms,
            deadline: None,
        }
    }

    /// Starts or restarts the quiet period from `now`.
    pub fn reset(&mut self, now_ms: i64) {
        self.deadline = Some(now_ms + self.quiet_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per armed period, when `now` has reached
    /// the deadline.
    pub fn take_due(&mut self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Coalesces bursts of canonical-state mutations into one persistence pass.
///
/// Every mutation restarts the timer; when the quiet period elapses the
/// owner flushes the local store and, if allowed, requests a remote sync.
#[derive(Debug)]
pub struct ChangeDebouncer {
    timer: DebounceTimer,
}

impl ChangeDebouncer {
    pub fn new(quiet_ms: i64) -> Self {
        Self {
            timer: DebounceTimer::new(quiet_ms),
        }
    }

    /// Records a canonical-state mutation, restarting the quiet period.
    pub fn note_mutation(&mut self, now_ms: i64) {
        self.timer.reset(now_ms);
    }

    /// True while a flush is pending.
    pub fn is_dirty(&self) -> bool {
        self.timer.is_armed()
    }

    /// Polls the timer; returns true when the settled mutations should be
    /// flushed now.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        self.timer.take_due(now_ms)
    }
}

/// Timed flag set while a pull is being applied, so the resulting local
/// mutations do not immediately push back to the remote (a pull→push→pull
/// feedback loop). Every component that can trigger an outbound sync must
/// check it first.
#[derive(Debug, Default)]
pub struct CloudUpdateGuard {
    active_until: Option<i64>,
}

impl CloudUpdateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engages the guard for `grace_ms` starting at `now`.
    pub fn engage(&mut self, now_ms: i64, grace_ms: i64) {
        self.active_until = Some(now_ms + grace_ms);
    }

    pub fn is_active(&self, now_ms: i64) -> bool {
        matches!(self.active_until, Some(until) if now_ms < until)
    }

    pub fn clear(&mut self) {
        self.active_until = None;
    }
}
