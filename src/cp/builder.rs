//! Compiles eligibility and transport modes into a selection model.
//!
//! Creates:
//! - A selection variable per (step, valid capability)
//! - A contradiction for every step without a valid capability
//! - At-least-one plus pairwise mutual exclusion per step
//! - Continuity implications for interior transport steps
//! - A maximize-count objective over all variables
//!
//! # Continuity rules
//!
//! | Mode | Neighbour | Resource of the neighbour's variable |
//! |------|-----------|--------------------------------------|
//! | Feed | predecessor | same |
//! | Discharge | successor | same |
//! | Transfer | predecessor and successor | different |
//!
//! When a neighbour has no matching variable, the step's variable is
//! forced false instead.

use tracing::info;

use super::{Constraint, ConstraintModel, Objective, VarId};
use crate::eligibility::EligibilityTable;
use crate::error::Result;
use crate::models::Recipe;
use crate::transport::{TransportMode, TransportModes};

/// Builds a [`ConstraintModel`] from the outputs of the earlier stages.
///
/// # Example
/// ```
/// use u_capmatch::config::MatchConfig;
/// use u_capmatch::cp::ModelBuilder;
/// use u_capmatch::eligibility::EligibilityFilter;
/// use u_capmatch::models::{Capability, CapabilityCatalog, ParameterRange, Recipe, RecipeStep};
/// use u_capmatch::transport::TransportClassifier;
///
/// let catalog = CapabilityCatalog::new().with_capability(
///     Capability::new("R1", "Heat", "HeatingProcess")
///         .with_parameter("temp", ParameterRange::closed(20.0, 100.0)),
/// );
/// let recipe = Recipe::new(vec![
///     RecipeStep::new("S1", "HeatingProcess").with_parameter("temp", "50"),
/// ]);
/// let config = MatchConfig::default();
/// let eligibility = EligibilityFilter::new(&config).evaluate(&catalog, &recipe);
/// let modes = TransportClassifier::new(&config).classify(&recipe);
///
/// let model = ModelBuilder::new(&recipe, &eligibility, &modes).build().unwrap();
/// assert_eq!(model.variable_count(), 1);
/// assert!(model.is_ready());
/// ```
pub struct ModelBuilder<'a> {
    recipe: &'a Recipe,
    eligibility: &'a EligibilityTable,
    modes: &'a TransportModes,
    name: String,
}

/// Which neighbour a continuity rule looks at.
#[derive(Debug, Clone, Copy)]
enum Side {
    Predecessor,
    Successor,
}

impl<'a> ModelBuilder<'a> {
    /// Creates a builder.
    pub fn new(
        recipe: &'a Recipe,
        eligibility: &'a EligibilityTable,
        modes: &'a TransportModes,
    ) -> Self {
        Self {
            recipe,
            eligibility,
            modes,
            name: "capability-matching".to_string(),
        }
    }

    /// Sets the model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds and seals the model.
    pub fn build(&self) -> Result<ConstraintModel> {
        let mut model = ConstraintModel::new(&self.name);

        // Selection variables, in recipe order then catalog order.
        for step in self.recipe.steps() {
            for capability_id in self.eligibility.valid_for(&step.id) {
                model.add_variable(&step.id, capability_id)?;
            }
        }

        // Exactly one capability per step.
        for step in self.recipe.steps() {
            let vars: Vec<VarId> = model.variables_for(&step.id).map(|v| v.id).collect();
            if vars.is_empty() {
                model.add_constraint(Constraint::Contradiction {
                    step_id: step.id.clone(),
                })?;
                continue;
            }
            for (i, &a) in vars.iter().enumerate() {
                for &b in &vars[i + 1..] {
                    model.add_constraint(Constraint::MutualExclusion { a, b })?;
                }
            }
            model.add_constraint(Constraint::AtLeastOne {
                step_id: step.id.clone(),
                vars,
            })?;
        }

        // Material-flow continuity for interior transport steps.
        for (index, step) in self.recipe.steps().iter().enumerate() {
            if !self.recipe.is_interior(index) {
                continue;
            }
            let Some(mode) = self.modes.mode_of(&step.id) else {
                continue;
            };
            match mode {
                TransportMode::Feed => {
                    self.link(&mut model, index, Side::Predecessor, true)?;
                }
                TransportMode::Discharge => {
                    self.link(&mut model, index, Side::Successor, true)?;
                }
                TransportMode::Transfer => {
                    self.link(&mut model, index, Side::Predecessor, false)?;
                    self.link(&mut model, index, Side::Successor, false)?;
                }
            }
        }

        // Objective: maximize selected variables.
        let all: Vec<VarId> = model.variables().iter().map(|v| v.id).collect();
        model.set_objective(Objective::MaximizeCount(all))?;
        model.seal()?;

        info!(
            model = model.name(),
            steps = self.recipe.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "selection model built"
        );
        Ok(model)
    }

    /// For every variable of the step at `index`: if selected, the
    /// neighbour on `side` must select a capability on the same resource
    /// (`same_resource`) or on a different one.
    fn link(
        &self,
        model: &mut ConstraintModel,
        index: usize,
        side: Side,
        same_resource: bool,
    ) -> Result<()> {
        let neighbour = match side {
            Side::Predecessor => self.recipe.predecessor(index),
            Side::Successor => self.recipe.successor(index),
        };
        let (Some(step), Some(neighbour)) = (self.recipe.steps().get(index), neighbour) else {
            return Ok(());
        };

        let links: Vec<(VarId, Vec<VarId>)> = model
            .variables_for(&step.id)
            .map(|var| {
                let partners = model
                    .variables_for(&neighbour.id)
                    .filter(|other| (other.resource == var.resource) == same_resource)
                    .map(|other| other.id)
                    .collect();
                (var.id, partners)
            })
            .collect();

        for (var, partners) in links {
            let constraint = if partners.is_empty() {
                Constraint::ForcedFalse { var }
            } else {
                Constraint::Implies {
                    antecedent: var,
                    consequents: partners,
                }
            };
            model.add_constraint(constraint)?;
        }
        Ok(())
    }
}
