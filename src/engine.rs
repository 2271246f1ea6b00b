//! End-to-end matching pipeline.
//!
//! # Algorithm
//!
//! 1. Validate catalog and recipe identifiers.
//! 2. Classify every (step, capability) pair as valid or invalid.
//! 3. Resolve transport modes for interior transport steps.
//! 4. Build the selection model and seal it.
//! 5. Solve with the configured [`Oracle`] under the configured time limit.
//! 6. Read the assignment back, or report why there is none.
//!
//! [`MatchEngine::run_refined`] repeats steps 3-6 with the first-pass
//! assignment available, so transport modes that no rule could decide
//! are inferred from where the neighbouring steps actually ran.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::cp::{extract_assignment, BranchAndBoundOracle, ModelBuilder, Oracle, OracleOutcome, SolveLimits};
use crate::eligibility::{EligibilityFilter, EligibilityTable};
use crate::error::{MatchError, Result};
use crate::models::{Assignment, CapabilityCatalog, CapabilityDocument, Recipe, RecipeDocument};
use crate::transport::{TransportClassifier, TransportModes};
use crate::validation::validate_input;

/// Final state of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Every step has exactly one capability.
    Assigned(Assignment),
    /// No consistent assignment exists. `uncovered` lists the steps
    /// without any admissible capability; it is empty when the conflict
    /// comes from transport continuity instead.
    Unsatisfiable { uncovered: Vec<String> },
    /// The oracle's time limit expired first.
    TimedOut,
}

impl MatchOutcome {
    /// The assignment, if the run produced one.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            MatchOutcome::Assigned(assignment) => Some(assignment),
            _ => None,
        }
    }

    /// Whether the run produced an assignment.
    pub fn is_assigned(&self) -> bool {
        matches!(self, MatchOutcome::Assigned(_))
    }

    fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Assigned(_) => "assigned",
            MatchOutcome::Unsatisfiable { .. } => "unsatisfiable",
            MatchOutcome::TimedOut => "timed out",
        }
    }
}

/// Everything a run produced, including the intermediate tables needed
/// to explain the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Valid and rejected capabilities per step, with reasons.
    pub eligibility: EligibilityTable,
    /// Transport modes the model was built with.
    pub modes: TransportModes,
    /// Result of the solve.
    pub outcome: MatchOutcome,
}

impl MatchReport {
    /// The assignment, if the run produced one.
    pub fn assignment(&self) -> Option<&Assignment> {
        self.outcome.assignment()
    }

    /// Whether the run produced an assignment.
    pub fn is_assigned(&self) -> bool {
        self.outcome.is_assigned()
    }
}

/// Matches recipe steps to capabilities.
///
/// # Example
/// ```
/// use u_capmatch::engine::MatchEngine;
/// use u_capmatch::models::{Capability, CapabilityCatalog, ParameterRange, Recipe, RecipeStep};
///
/// let catalog = CapabilityCatalog::new().with_capability(
///     Capability::new("R1", "Heat", "HeatingProcess")
///         .with_parameter("temp", ParameterRange::closed(20.0, 100.0)),
/// );
/// let recipe = Recipe::new(vec![
///     RecipeStep::new("S1", "HeatingProcess").with_parameter("temp", "50"),
/// ]);
///
/// let report = MatchEngine::new().run(&catalog, &recipe).unwrap();
/// assert_eq!(report.assignment().unwrap().capability_for("S1"), Some("R1::Heat"));
/// ```
#[derive(Debug, Clone)]
pub struct MatchEngine<O = BranchAndBoundOracle> {
    config: MatchConfig,
    oracle: O,
}

impl MatchEngine<BranchAndBoundOracle> {
    /// Creates an engine with the default configuration and the built-in
    /// branch-and-bound oracle.
    pub fn new() -> Self {
        Self::with_oracle(BranchAndBoundOracle::new())
    }
}

impl Default for MatchEngine<BranchAndBoundOracle> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Oracle> MatchEngine<O> {
    /// Creates an engine with the default configuration and a custom oracle.
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            config: MatchConfig::default(),
            oracle,
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Runs one matching pass.
    ///
    /// # Errors
    /// [`MatchError::InvalidInput`] when validation fails, and
    /// [`MatchError::Oracle`] when the oracle itself fails. An
    /// unsatisfiable or timed-out solve is an `Ok` report.
    pub fn run(&self, catalog: &CapabilityCatalog, recipe: &Recipe) -> Result<MatchReport> {
        validate_input(catalog, recipe).map_err(MatchError::InvalidInput)?;
        self.pass(catalog, recipe, None, "solve")
    }

    /// Runs a first pass and, if it is assigned, a second pass whose
    /// transport classification may use resource continuity from the first
    /// assignment. Returns the last report.
    pub fn run_refined(&self, catalog: &CapabilityCatalog, recipe: &Recipe) -> Result<MatchReport> {
        let first = self.run(catalog, recipe)?;
        let Some(previous) = first.assignment() else {
            return Ok(first);
        };
        self.pass(catalog, recipe, Some(previous), "refined solve")
    }

    /// Builds catalog and recipe from their documents and runs one pass.
    pub fn run_documents(
        &self,
        capabilities: &CapabilityDocument,
        recipe: &RecipeDocument,
    ) -> Result<MatchReport> {
        let catalog = CapabilityCatalog::from_document(capabilities);
        let recipe = Recipe::from(recipe.clone().into_steps());
        self.run(&catalog, &recipe)
    }

    fn pass(
        &self,
        catalog: &CapabilityCatalog,
        recipe: &Recipe,
        previous: Option<&Assignment>,
        stage: &'static str,
    ) -> Result<MatchReport> {
        info!(
            stage,
            steps = recipe.len(),
            capabilities = catalog.len(),
            oracle = self.oracle.name(),
            "matching started"
        );

        let eligibility = EligibilityFilter::new(&self.config).evaluate(catalog, recipe);

        let mut classifier = TransportClassifier::new(&self.config);
        if let Some(previous) = previous {
            classifier = classifier.with_assignment(previous);
        }
        let modes = classifier.classify(recipe);

        let model = ModelBuilder::new(recipe, &eligibility, &modes).build()?;
        let limits = SolveLimits::from(&self.config);
        let outcome = self
            .oracle
            .solve(&model, &limits)
            .map_err(|e| MatchError::Oracle {
                stage,
                message: e.to_string(),
            })?;

        let outcome = match outcome {
            OracleOutcome::Satisfied(solution) => {
                MatchOutcome::Assigned(extract_assignment(&model, &eligibility, &solution))
            }
            OracleOutcome::Unsatisfiable => MatchOutcome::Unsatisfiable {
                uncovered: eligibility
                    .uncovered_steps()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            OracleOutcome::TimedOut => {
                warn!(stage, time_limit = ?limits.time_limit, "oracle time limit reached");
                MatchOutcome::TimedOut
            }
        };

        info!(stage, outcome = outcome.label(), "matching finished");
        Ok(MatchReport {
            eligibility,
            modes,
            outcome,
        })
    }
}
