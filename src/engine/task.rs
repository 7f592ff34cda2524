//! State transitions of a single simulated task.
//!
//! Every mutation is keyed by the run generation, so a tick or command that
//! belongs to a superseded run is ignored.

use crate::model::{TaskSnapshot, TaskStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("handle refers to a run that has been superseded")]
    StaleHandle,
    #[error("task is {0}, not running")]
    NotRunning(TaskStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Advanced,
    Completed,
    Ignored,
}

impl TaskSnapshot {
    pub(crate) fn begin(&mut self, generation: u64) {
        *self = TaskSnapshot {
            status: TaskStatus::Running,
            progress: 0.0,
            ticks: 0,
            failure: None,
            ticking: true,
            generation,
        };
    }

    pub(crate) fn apply_tick(&mut self, generation: u64, delta: f64) -> TickOutcome {
        if self.generation != generation || !self.ticking || self.status != TaskStatus::Running {
            return TickOutcome::Ignored;
        }
        self.ticks += 1;
        let next = self.progress + delta.max(0.0);
        if next >= 100.0 {
            self.progress = 100.0;
            self.status = TaskStatus::Completed;
            self.ticking = false;
            TickOutcome::Completed
        } else {
            self.progress = next;
            TickOutcome::Advanced
        }
    }

    /// Stop the timer for `generation`, leaving status and progress untouched.
    pub(crate) fn halt(&mut self, generation: u64) -> bool {
        if self.generation != generation || !self.ticking {
            return false;
        }
        self.ticking = false;
        true
    }

    pub(crate) fn fail(&mut self, generation: u64, reason: &str) -> Result<(), TaskError> {
        if self.generation != generation {
            return Err(TaskError::StaleHandle);
        }
        if self.status != TaskStatus::Running {
            return Err(TaskError::NotRunning(self.status));
        }
        self.status = TaskStatus::Failed;
        self.ticking = false;
        self.failure = Some(reason.to_string());
        Ok(())
    }
}
