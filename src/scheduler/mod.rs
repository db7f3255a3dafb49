//! Delayed callbacks owned by a game session.
//!
//! The state machine never sleeps. It arms a timer through a [`Scheduler`],
//! keeps the returned [`TimerId`], and cancels it when the state that armed it
//! is torn down. A fired timer comes back as a [`ScheduledTimer`] and is fed to
//! `GameMachine::handle_timer`, which drops it unless both the session token
//! and the timer id still match what it is waiting for.

mod manual;
mod spawned;

pub use manual::ManualScheduler;
pub use spawned::TokioScheduler;

use std::time::Duration;

use serde::Serialize;

use crate::game::SessionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerKind {
    /// One-second countdown step while playing.
    CountdownTick,
    /// Hides the active hint marker.
    HintExpiry,
    /// Clears the hit/miss feedback marker.
    FeedbackClear,
    /// Completes a deferred win after the last cat was found.
    WinTransition,
    /// Shows the result overlay on a finished board.
    ResultReveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub id: TimerId,
    pub token: SessionToken,
    pub kind: TimerKind,
}

pub trait Scheduler {
    fn arm(&mut self, delay: Duration, token: SessionToken, kind: TimerKind) -> TimerId;

    /// Cancelling an id that already fired or was never armed is a no-op.
    fn cancel(&mut self, id: TimerId);

    /// Called once the machine has consumed a fired timer.
    fn acknowledge(&mut self, _id: TimerId) {}
}
