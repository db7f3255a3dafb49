use std::time::Duration;

use crate::game::SessionToken;

use super::{ScheduledTimer, Scheduler, TimerId, TimerKind};

#[derive(Debug, Clone)]
struct Pending {
    due: Duration,
    timer: ScheduledTimer,
}

/// Virtual-clock scheduler. Nothing fires until the owner advances time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|pending| pending.timer.kind == kind)
    }

    /// Removes and returns the earliest timer due at or before `deadline`,
    /// moving the clock to its due time. Ties fire in arming order.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<ScheduledTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= deadline)
            .min_by_key(|(_, pending)| (pending.due, pending.timer.id))
            .map(|(index, _)| index)?;

        let pending = self.pending.remove(index);
        self.now = self.now.max(pending.due);
        Some(pending.timer)
    }

    /// Moves the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, delay: Duration, token: SessionToken, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Pending {
            due: self.now + delay,
            timer: ScheduledTimer { id, token, kind },
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|pending| pending.timer.id != id);
    }
}
