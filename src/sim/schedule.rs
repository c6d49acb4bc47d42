//! Deferred one-shot tasks on the simulation clock
//!
//! Replaces "run this after 0.5s" closures. Tasks are keyed by the level session
//! that scheduled them so leaving a level can cancel everything it left behind.

use serde::{Deserialize, Serialize};

/// Generation number of a level session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct TaskId(u64);

/// Work that runs after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Discard the ball and respawn it at the muzzle
    ResetBall,
    /// Leave for the level-complete screen
    ShowLevelComplete { next_level_index: usize },
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TaskId,
    session: SessionId,
    due: f64,
    task: Task,
}

/// Float slack so a delay of N fixed steps fires on step N
const DUE_EPSILON: f64 = 1e-6;

/// Single-threaded timer queue
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: f64,
    next_id: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of simulation time elapsed
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, session: SessionId, delay: f32, task: Task) {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            session,
            due: self.now + f64::from(delay.max(0.0)),
            task,
        });
    }

    /// Drop every task of `session`. Returns how many were cancelled.
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.session != session);
        before - self.pending.len()
    }

    /// Advance the clock and hand back due tasks, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<(SessionId, Task)> {
        self.now += f64::from(dt);
        let now = self.now + DUE_EPSILON;

        let mut due: Vec<Scheduled> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|s| (s.session, s.task)).collect()
    }
}
