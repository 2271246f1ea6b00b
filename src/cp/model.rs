//! Boolean selection model.
//!
//! One [`SelectionVariable`] per (step, admissible capability) pair, a list
//! of [`Constraint`]s over them, and an optional [`Objective`]. Every
//! constraint compiles to a single CNF [`Clause`], which is the form
//! handed to an [`Oracle`](super::Oracle).
//!
//! # Build stages
//!
//! `Empty → VariablesCreated → ConstraintsAdded → ObjectiveSet → Ready`
//!
//! Stages only move forward. Variables can no longer be added once a
//! constraint exists, constraints can no longer be added once the
//! objective is set, and nothing changes after [`seal`](ConstraintModel::seal).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{MatchError, Result};
use crate::models::resource_of;

/// Index of a selection variable within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    /// Position in the model's variable list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub var: VarId,
    pub positive: bool,
}

impl Literal {
    /// The variable itself.
    pub fn pos(var: VarId) -> Self {
        Self {
            var,
            positive: true,
        }
    }

    /// The negated variable.
    pub fn neg(var: VarId) -> Self {
        Self {
            var,
            positive: false,
        }
    }

    /// Truth value under an assignment of the variable.
    #[inline]
    pub fn holds(&self, value: bool) -> bool {
        value == self.positive
    }
}

/// A disjunction of literals. The empty clause is unsatisfiable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// Creates a clause.
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// Literals of the clause.
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Whether the clause has no literal (always false).
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether the clause holds under a complete assignment.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        self.literals
            .iter()
            .any(|lit| values.get(lit.var.0).is_some_and(|v| lit.holds(*v)))
    }
}

/// "Step `step_id` uses capability `capability_id`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionVariable {
    pub id: VarId,
    pub step_id: String,
    pub capability_id: String,
    /// Resource part of the capability id.
    pub resource: String,
}

/// A constraint of the selection model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// At least one of the step's variables is selected.
    AtLeastOne { step_id: String, vars: Vec<VarId> },
    /// Two variables of the same step are not both selected.
    MutualExclusion { a: VarId, b: VarId },
    /// Selecting `antecedent` requires one of `consequents`.
    Implies {
        antecedent: VarId,
        consequents: Vec<VarId>,
    },
    /// The variable can never be selected.
    ForcedFalse { var: VarId },
    /// The step cannot be covered; the whole model is unsatisfiable.
    Contradiction { step_id: String },
}

impl Constraint {
    /// Compiles the constraint into one CNF clause.
    pub fn to_clause(&self) -> Clause {
        match self {
            Constraint::AtLeastOne { vars, .. } => {
                Clause::new(vars.iter().copied().map(Literal::pos).collect())
            }
            Constraint::MutualExclusion { a, b } => {
                Clause::new(vec![Literal::neg(*a), Literal::neg(*b)])
            }
            Constraint::Implies {
                antecedent,
                consequents,
            } => {
                let mut literals = Vec::with_capacity(consequents.len() + 1);
                literals.push(Literal::neg(*antecedent));
                literals.extend(consequents.iter().copied().map(Literal::pos));
                Clause::new(literals)
            }
            Constraint::ForcedFalse { var } => Clause::new(vec![Literal::neg(*var)]),
            Constraint::Contradiction { .. } => Clause::new(Vec::new()),
        }
    }

    /// Variables referenced by the constraint.
    pub fn vars(&self) -> Vec<VarId> {
        match self {
            Constraint::AtLeastOne { vars, .. } => vars.clone(),
            Constraint::MutualExclusion { a, b } => vec![*a, *b],
            Constraint::Implies {
                antecedent,
                consequents,
            } => std::iter::once(*antecedent)
                .chain(consequents.iter().copied())
                .collect(),
            Constraint::ForcedFalse { var } => vec![*var],
            Constraint::Contradiction { .. } => Vec::new(),
        }
    }
}

/// Optimization objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Maximize the number of true variables among the listed ones.
    MaximizeCount(Vec<VarId>),
}

impl Objective {
    /// Objective value under a complete assignment.
    pub fn value(&self, values: &[bool]) -> i64 {
        match self {
            Objective::MaximizeCount(vars) => vars
                .iter()
                .filter(|v| values.get(v.0).copied().unwrap_or(false))
                .count() as i64,
        }
    }

    /// Variables contributing to the objective.
    pub fn vars(&self) -> &[VarId] {
        match self {
            Objective::MaximizeCount(vars) => vars,
        }
    }
}

/// Build stage of a [`ConstraintModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelStage {
    Empty,
    VariablesCreated,
    ConstraintsAdded,
    ObjectiveSet,
    Ready,
}

/// Selection variables, constraints and objective of one solve.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    name: String,
    variables: Vec<SelectionVariable>,
    index: HashMap<(String, String), VarId>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    stage: ModelStage,
}

impl ConstraintModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            objective: None,
            stage: ModelStage::Empty,
        }
    }

    /// Moves to `next` if the current stage is at most `latest`.
    fn advance(&mut self, operation: &'static str, latest: ModelStage, next: ModelStage) -> Result<()> {
        if self.stage > latest {
            return Err(MatchError::InvalidStage {
                operation,
                expected: latest,
                found: self.stage,
            });
        }
        self.stage = self.stage.max(next);
        Ok(())
    }

    /// Adds the selection variable for (step, capability).
    ///
    /// Adding the same pair twice returns the existing variable.
    pub fn add_variable(&mut self, step_id: &str, capability_id: &str) -> Result<VarId> {
        self.advance(
            "add_variable",
            ModelStage::VariablesCreated,
            ModelStage::VariablesCreated,
        )?;
        let key = (step_id.to_string(), capability_id.to_string());
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        let id = VarId(self.variables.len());
        self.variables.push(SelectionVariable {
            id,
            step_id: step_id.to_string(),
            capability_id: capability_id.to_string(),
            resource: resource_of(capability_id).to_string(),
        });
        self.index.insert(key, id);
        Ok(id)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        if let Some(unknown) = constraint.vars().into_iter().find(|v| v.0 >= self.variables.len()) {
            return Err(MatchError::UnknownVariable(unknown.0));
        }
        self.advance(
            "add_constraint",
            ModelStage::ConstraintsAdded,
            ModelStage::ConstraintsAdded,
        )?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Sets the objective.
    pub fn set_objective(&mut self, objective: Objective) -> Result<()> {
        if let Some(unknown) = objective.vars().iter().find(|v| v.0 >= self.variables.len()) {
            return Err(MatchError::UnknownVariable(unknown.0));
        }
        self.advance(
            "set_objective",
            ModelStage::ConstraintsAdded,
            ModelStage::ObjectiveSet,
        )?;
        self.objective = Some(objective);
        Ok(())
    }

    /// Freezes the model for solving.
    pub fn seal(&mut self) -> Result<()> {
        self.advance("seal", ModelStage::ObjectiveSet, ModelStage::Ready)
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current build stage.
    pub fn stage(&self) -> ModelStage {
        self.stage
    }

    /// Whether the model has been sealed.
    pub fn is_ready(&self) -> bool {
        self.stage == ModelStage::Ready
    }

    /// All selection variables, indexed by [`VarId`].
    pub fn variables(&self) -> &[SelectionVariable] {
        &self.variables
    }

    /// A selection variable.
    pub fn variable(&self, id: VarId) -> Option<&SelectionVariable> {
        self.variables.get(id.0)
    }

    /// Variable for (step, capability), if the pair is eligible.
    pub fn var_for(&self, step_id: &str, capability_id: &str) -> Option<VarId> {
        self.index
            .get(&(step_id.to_string(), capability_id.to_string()))
            .copied()
    }

    /// Variables of a step, in creation order.
    pub fn variables_for<'a>(&'a self, step_id: &'a str) -> impl Iterator<Item = &'a SelectionVariable> {
        self.variables.iter().filter(move |v| v.step_id == step_id)
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// All constraints, in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// The objective, if set.
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// The constraints in CNF.
    pub fn clauses(&self) -> Vec<Clause> {
        self.constraints.iter().map(Constraint::to_clause).collect()
    }

    /// Whether a complete assignment satisfies every constraint.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        values.len() == self.variables.len()
            && self.constraints.iter().all(|c| c.to_clause().is_satisfied(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progression() {
        let mut m = ConstraintModel::new("test");
        assert_eq!(m.stage(), ModelStage::Empty);

        let a = m.add_variable("S1", "R1::A").unwrap();
        let b = m.add_variable("S1", "R2::B").unwrap();
        assert_eq!(m.stage(), ModelStage::VariablesCreated);

        m.add_constraint(Constraint::MutualExclusion { a, b }).unwrap();
        assert_eq!(m.stage(), ModelStage::ConstraintsAdded);

        m.set_objective(Objective::MaximizeCount(vec![a, b])).unwrap();
        assert_eq!(m.stage(), ModelStage::ObjectiveSet);

        m.seal().unwrap();
        assert!(m.is_ready());
    }

    #[test]
    fn test_out_of_order_operations_rejected() {
        let mut m = ConstraintModel::new("test");
        let a = m.add_variable("S1", "R1::A").unwrap();
        m.add_constraint(Constraint::ForcedFalse { var: a }).unwrap();

        let err = m.add_variable("S2", "R1::A").unwrap_err();
        assert!(matches!(
            err,
            MatchError::InvalidStage {
                found: ModelStage::ConstraintsAdded,
                ..
            }
        ));

        m.seal().unwrap();
        assert!(m.add_constraint(Constraint::ForcedFalse { var: a }).is_err());
        assert!(m.seal().is_err());
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let mut m = ConstraintModel::new("test");
        let err = m
            .add_constraint(Constraint::ForcedFalse { var: VarId(3) })
            .unwrap_err();
        assert!(matches!(err, MatchError::UnknownVariable(3)));
        assert_eq!(m.stage(), ModelStage::Empty);
    }

    #[test]
    fn test_duplicate_pair_reuses_variable() {
        let mut m = ConstraintModel::new("test");
        let a = m.add_variable("S1", "R1::A").unwrap();
        let again = m.add_variable("S1", "R1::A").unwrap();
        assert_eq!(a, again);
        assert_eq!(m.variable_count(), 1);
        assert_eq!(m.variable(a).unwrap().resource, "R1");
        assert_eq!(m.var_for("S1", "R1::A"), Some(a));
        assert_eq!(m.var_for("S1", "R9::Z"), None);
    }

    #[test]
    fn test_clause_compilation() {
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));

        let clause = Constraint::Implies {
            antecedent: a,
            consequents: vec![b, c],
        }
        .to_clause();
        assert_eq!(
            clause.literals(),
            &[Literal::neg(a), Literal::pos(b), Literal::pos(c)]
        );

        let clause = Constraint::Contradiction {
            step_id: "S1".into(),
        }
        .to_clause();
        assert!(clause.is_empty());
        assert!(!clause.is_satisfied(&[true, true, true]));

        let clause = Constraint::MutualExclusion { a, b }.to_clause();
        assert!(!clause.is_satisfied(&[true, true]));
        assert!(clause.is_satisfied(&[true, false]));
    }

    #[test]
    fn test_objective_value() {
        let obj = Objective::MaximizeCount(vec![VarId(0), VarId(2)]);
        assert_eq!(obj.value(&[true, true, true]), 2);
        assert_eq!(obj.value(&[false, true, false]), 0);
    }
}
