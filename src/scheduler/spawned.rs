use std::{collections::HashMap, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::game::SessionToken;

use super::{ScheduledTimer, Scheduler, TimerId, TimerKind};

/// Real-time scheduler backed by tokio tasks.
///
/// Each armed timer is a task sleeping on a child of one root
/// [`CancellationToken`]; fired timers are delivered on the channel returned
/// by [`TokioScheduler::new`]. Must be used from inside a tokio runtime.
pub struct TokioScheduler {
    sender: mpsc::UnboundedSender<ScheduledTimer>,
    root: CancellationToken,
    armed: HashMap<TimerId, CancellationToken>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledTimer>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            sender,
            root: CancellationToken::new(),
            armed: HashMap::new(),
            next_id: 0,
        };
        (scheduler, receiver)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&mut self, delay: Duration, token: SessionToken, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let timer = ScheduledTimer { id, token, kind };

        let cancel_token = self.root.child_token();
        let task_token = cancel_token.clone();
        let sender = self.sender.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the controller shut down.
                    let _ = sender.send(timer);
                }
                _ = task_token.cancelled() => {}
            }
        });

        self.armed.insert(id, cancel_token);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(token) = self.armed.remove(&id) {
            token.cancel();
        }
    }

    fn acknowledge(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
