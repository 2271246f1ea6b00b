//! Reference oracle: DPLL search with an objective bound.
//!
//! # Algorithm
//!
//! 1. Unit propagation over all clauses; a falsified clause backtracks.
//! 2. Bound: the current count of true objective variables plus every
//!    still-unassigned one is an upper bound; a branch that cannot beat
//!    the incumbent is cut.
//! 3. Branch on the lowest unassigned variable, `true` first.
//!
//! Branching order makes the search deterministic: among equally good
//! assignments the one found first wins, which prefers lower variable
//! ids (earlier steps, then earlier capabilities in catalog order).
//!
//! # Complexity
//! Exponential in the number of variables in the worst case. Selection
//! models are small (a handful of candidates per step) and the
//! exactly-one structure propagates strongly, so the search is fast in
//! practice. The deadline is checked at every node.
//!
//! # Reference
//! Davis, Logemann & Loveland (1962), "A machine program for theorem-proving"

use std::time::Instant;
use tracing::{debug, trace};

use super::{Clause, ConstraintModel, ModelStage, Oracle, OracleOutcome, Solution, SolveLimits};
use crate::error::{MatchError, Result};

/// Exact branch-and-bound MaxSAT oracle for small selection models.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundOracle;

impl BranchAndBoundOracle {
    /// Creates the oracle.
    pub fn new() -> Self {
        Self
    }
}

impl Oracle for BranchAndBoundOracle {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, model: &ConstraintModel, limits: &SolveLimits) -> Result<OracleOutcome> {
        if !model.is_ready() {
            return Err(MatchError::InvalidStage {
                operation: "solve",
                expected: ModelStage::Ready,
                found: model.stage(),
            });
        }

        let clauses = model.clauses();
        if clauses.iter().any(Clause::is_empty) {
            debug!(model = model.name(), "model contains an empty clause");
            return Ok(OracleOutcome::Unsatisfiable);
        }

        let mut in_objective = vec![false; model.variable_count()];
        if let Some(objective) = model.objective() {
            for var in objective.vars() {
                in_objective[var.0] = true;
            }
        }

        let mut search = Search {
            clauses: &clauses,
            in_objective: &in_objective,
            deadline: limits.time_limit.map(|limit| Instant::now() + limit),
            values: vec![None; model.variable_count()],
            trail: Vec::new(),
            best: None,
            timed_out: false,
            nodes: 0,
        };
        search.run();

        debug!(
            model = model.name(),
            nodes = search.nodes,
            timed_out = search.timed_out,
            found = search.best.is_some(),
            "search finished"
        );

        if search.timed_out {
            return Ok(OracleOutcome::TimedOut);
        }
        Ok(match search.best {
            Some((values, _)) => {
                let objective = model.objective().map_or(0, |o| o.value(&values));
                OracleOutcome::Satisfied(Solution::new(values, objective))
            }
            None => OracleOutcome::Unsatisfiable,
        })
    }
}

struct Search<'a> {
    clauses: &'a [Clause],
    in_objective: &'a [bool],
    deadline: Option<Instant>,
    values: Vec<Option<bool>>,
    trail: Vec<usize>,
    best: Option<(Vec<bool>, i64)>,
    timed_out: bool,
    nodes: u64,
}

impl Search<'_> {
    fn run(&mut self) {
        self.node();
    }

    fn node(&mut self) {
        self.nodes += 1;
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.timed_out = true;
            return;
        }

        let mark = self.trail.len();
        if !self.propagate() {
            self.undo(mark);
            return;
        }

        let (current, open) = self.objective_bounds();
        if let Some((_, best)) = &self.best {
            if current + open <= *best {
                trace!(current, open, best, "pruned");
                self.undo(mark);
                return;
            }
        }

        match self.values.iter().position(Option::is_none) {
            None => {
                let values = self.values.iter().map(|v| v.unwrap_or(false)).collect();
                self.best = Some((values, current));
            }
            Some(var) => {
                for value in [true, false] {
                    if self.timed_out {
                        break;
                    }
                    let branch_mark = self.trail.len();
                    self.assign(var, value);
                    self.node();
                    self.undo(branch_mark);
                }
            }
        }

        self.undo(mark);
    }

    /// Unit propagation to fixpoint. Returns `false` on conflict.
    fn propagate(&mut self) -> bool {
        loop {
            let mut changed = false;
            for clause in self.clauses {
                let mut satisfied = false;
                let mut open = 0usize;
                let mut last_open = None;
                for lit in clause.literals() {
                    match self.values[lit.var.0] {
                        Some(v) if lit.holds(v) => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            open += 1;
                            last_open = Some(*lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (open, last_open) {
                    (0, _) => return false,
                    (1, Some(lit)) => {
                        self.assign(lit.var.0, lit.positive);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }

    /// (true objective variables, unassigned objective variables).
    fn objective_bounds(&self) -> (i64, i64) {
        let mut current = 0;
        let mut open = 0;
        for (value, counted) in self.values.iter().zip(self.in_objective) {
            if !counted {
                continue;
            }
            match value {
                Some(true) => current += 1,
                None => open += 1,
                Some(false) => {}
            }
        }
        (current, open)
    }

    fn assign(&mut self, var: usize, value: bool) {
        self.values[var] = Some(value);
        self.trail.push(var);
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(var) = self.trail.pop() {
                self.values[var] = None;
            }
        }
    }
}
