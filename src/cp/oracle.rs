//! Solving oracle interface.
//!
//! The engine does not depend on a particular SAT or MaxSAT algorithm.
//! Anything that can take a sealed [`ConstraintModel`] and return a
//! satisfying, objective-maximizing assignment implements [`Oracle`]:
//! an external solver binding, an integer-program backend, or the
//! built-in [`BranchAndBoundOracle`](super::BranchAndBoundOracle).

use std::time::Duration;

use super::{ConstraintModel, VarId};
use crate::config::MatchConfig;
use crate::error::Result;

/// Limits for one oracle call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveLimits {
    /// Wall-clock limit. `None` = unbounded.
    pub time_limit: Option<Duration>,
}

impl SolveLimits {
    /// No limits.
    pub fn unbounded() -> Self {
        Self { time_limit: None }
    }

    /// Limits with a time limit.
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
        }
    }
}

impl From<&MatchConfig> for SolveLimits {
    fn from(config: &MatchConfig) -> Self {
        Self {
            time_limit: config.time_limit(),
        }
    }
}

/// A satisfying assignment returned by an oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<bool>,
    objective: i64,
}

impl Solution {
    /// Creates a solution from a complete assignment.
    pub fn new(values: Vec<bool>, objective: i64) -> Self {
        Self { values, objective }
    }

    /// Value of a variable (false if out of range).
    pub fn is_true(&self, var: VarId) -> bool {
        self.values.get(var.0).copied().unwrap_or(false)
    }

    /// The complete assignment, indexed by [`VarId`].
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Variables set to true.
    pub fn true_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| VarId(i))
    }

    /// Objective value of the assignment.
    pub fn objective(&self) -> i64 {
        self.objective
    }
}

/// Result of an oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    /// A satisfying assignment maximizing the objective.
    Satisfied(Solution),
    /// No assignment satisfies the constraints.
    Unsatisfiable,
    /// The time limit expired before the search completed.
    TimedOut,
}

impl OracleOutcome {
    /// Whether a solution was found.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, OracleOutcome::Satisfied(_))
    }

    /// The solution, if any.
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            OracleOutcome::Satisfied(solution) => Some(solution),
            _ => None,
        }
    }
}

/// A boolean satisfiability / optimization backend.
///
/// Implementations must only be called with a sealed model and must
/// report exhaustion of `limits.time_limit` as [`OracleOutcome::TimedOut`],
/// never as unsatisfiable.
pub trait Oracle {
    /// Backend name, for logging.
    fn name(&self) -> &'static str;

    /// Solves the model.
    ///
    /// `Err` is reserved for structural problems (e.g. an unsealed model or
    /// a backend failure); unsatisfiability is a normal outcome.
    fn solve(&self, model: &ConstraintModel, limits: &SolveLimits) -> Result<OracleOutcome>;
}
