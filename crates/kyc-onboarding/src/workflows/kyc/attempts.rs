use serde::{Deserialize, Serialize};

use super::domain::{Score, SubTask};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_PASS_SCORE: u8 = 70;

/// Number of completed attempts for a sub-task. Never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptCounter(u32);

impl AttemptCounter {
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    pub const fn count(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn recorded(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Per sub-task attempt counters owned by a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttemptTracker {
    scan_identity: AttemptCounter,
    scan_address: AttemptCounter,
    upload: AttemptCounter,
}

impl AttemptTracker {
    pub fn get(&self, task: SubTask) -> u32 {
        self.counter(task).count()
    }

    /// Count one completed attempt (success or failure) and return the new total.
    pub fn record(&mut self, task: SubTask) -> u32 {
        let slot = self.counter_mut(task);
        *slot = slot.recorded();
        slot.count()
    }

    fn counter(&self, task: SubTask) -> AttemptCounter {
        match task {
            SubTask::ScanIdentity => self.scan_identity,
            SubTask::ScanAddress => self.scan_address,
            SubTask::Upload => self.upload,
        }
    }

    fn counter_mut(&mut self, task: SubTask) -> &mut AttemptCounter {
        match task {
            SubTask::ScanIdentity => &mut self.scan_identity,
            SubTask::ScanAddress => &mut self.scan_address,
            SubTask::Upload => &mut self.upload,
        }
    }
}

/// Retry allowance for scans. The counter itself is never clamped; callers compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptBudget {
    pub max_attempts: u32,
    pub pass_score: u8,
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pass_score: DEFAULT_PASS_SCORE,
        }
    }
}

impl AttemptBudget {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    pub fn remaining(&self, attempts: u32) -> u32 {
        self.max_attempts.saturating_sub(attempts)
    }

    pub fn passes(&self, score: Option<Score>, attempts: u32) -> bool {
        passes_with_retry_budget(score, attempts, self.max_attempts, self.pass_score)
    }
}

/// A result passes when it meets the bar, or when the budget is spent and the
/// result is deferred to manual review. No score yet never passes.
pub fn passes_with_retry_budget(
    score: Option<Score>,
    attempts: u32,
    max_attempts: u32,
    pass_score: u8,
) -> bool {
    match score {
        Some(score) => score.value() >= pass_score || attempts >= max_attempts,
        None => false,
    }
}
