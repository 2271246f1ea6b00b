//! Boolean assignment model and solving.
//!
//! Compiles the eligibility table and transport modes into a selection
//! model (one boolean per admissible step/capability pair), hands it to an
//! [`Oracle`], and reads the chosen capabilities back.
//!
//! # Pipeline
//!
//! ```text
//! EligibilityTable ─┐
//!                   ├─ ModelBuilder ─▶ ConstraintModel ─▶ Oracle ─▶ Solution
//! TransportModes ───┘                                              │
//!                                    extract_assignment ◀──────────┘
//! ```
//!
//! # Reference
//! - Biere et al. (2009), "Handbook of Satisfiability", ch. 19 (MaxSAT)

mod branch_bound;
mod builder;
mod extract;
mod model;
mod oracle;

pub use branch_bound::BranchAndBoundOracle;
pub use builder::ModelBuilder;
pub use extract::extract_assignment;
pub use model::{
    Clause, Constraint, ConstraintModel, Literal, ModelStage, Objective, SelectionVariable, VarId,
};
pub use oracle::{Oracle, OracleOutcome, Solution, SolveLimits};
