//! Search run configuration.

use serde::{Deserialize, Serialize};
use tg_parallel::DispatchMode;

use crate::objective::ObjectiveDirection;

/// What the driver does when cross-validating an assignment fails.
///
/// An assignment the estimator rejects is always recorded as failed and the
/// rest of the grid still runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Return the cross-validation failure of the earliest failing assignment.
    #[default]
    Abort,
    /// Keep failed assignments in the result and rank only the others.
    Record,
}

/// Tunables for a grid search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Concurrent assignment workers; `0` uses every rayon thread.
    pub n_jobs: usize,

    /// Concurrent fold workers inside each assignment. The outer level
    /// usually already saturates the machine, so this defaults to 1.
    pub cv_jobs: usize,

    pub direction: ObjectiveDirection,

    pub error_policy: ErrorPolicy,

    pub dispatch: DispatchMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_jobs: 0,
            cv_jobs: 1,
            direction: ObjectiveDirection::Maximize,
            error_policy: ErrorPolicy::Abort,
            dispatch: DispatchMode::Static,
        }
    }
}

impl SearchConfig {
    pub fn with_n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = n;
        self
    }

    pub fn with_cv_jobs(mut self, n: usize) -> Self {
        self.cv_jobs = n;
        self
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = mode;
        self
    }
}
