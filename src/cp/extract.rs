//! Reads a step → capability assignment back out of an oracle solution.

use tracing::warn;

use super::{ConstraintModel, Solution};
use crate::eligibility::EligibilityTable;
use crate::models::Assignment;

/// Maps a solution back to the recipe steps.
///
/// Each step takes the first capability, in eligibility order, whose
/// selection variable is true. Steps with no true variable are left out.
/// Under the exactly-one constraints of a built model every covered step
/// has exactly one.
pub fn extract_assignment(
    model: &ConstraintModel,
    eligibility: &EligibilityTable,
    solution: &Solution,
) -> Assignment {
    let mut assignment = Assignment::new();
    for record in eligibility.records() {
        let selected = record.valid.iter().find(|capability_id| {
            model
                .var_for(&record.step_id, capability_id)
                .is_some_and(|var| solution.is_true(var))
        });
        match selected {
            Some(capability_id) => assignment.assign(record.step_id.clone(), capability_id.clone()),
            None if record.is_covered() => {
                warn!(step = %record.step_id, "no capability selected for covered step")
            }
            None => {}
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::cp::{Constraint, ModelBuilder, Objective};
    use crate::eligibility::EligibilityFilter;
    use crate::models::{Capability, CapabilityCatalog, Recipe, RecipeStep};
    use crate::transport::TransportModes;

    fn table(recipe: &Recipe) -> EligibilityTable {
        let catalog = CapabilityCatalog::new()
            .with_capability(Capability::new("R1", "Heat", "Heating"))
            .with_capability(Capability::new("R2", "Heat", "Heating"))
            .with_capability(Capability::new("R2", "Mix", "Mixing"));
        EligibilityFilter::new(&MatchConfig::default()).evaluate(&catalog, recipe)
    }

    #[test]
    fn test_selected_variables_become_assignment() {
        let recipe = Recipe::new(vec![
            RecipeStep::new("S1", "Heating"),
            RecipeStep::new("S2", "Mixing"),
        ]);
        let eligibility = table(&recipe);
        let model = ModelBuilder::new(&recipe, &eligibility, &TransportModes::new())
            .build()
            .unwrap();

        // x0 = S1/R1::Heat, x1 = S1/R2::Heat, x2 = S2/R2::Mix
        let solution = Solution::new(vec![false, true, true], 2);
        let assignment = extract_assignment(&model, &eligibility, &solution);

        assert_eq!(assignment.capability_for("S1"), Some("R2::Heat"));
        assert_eq!(assignment.capability_for("S2"), Some("R2::Mix"));
        assert_eq!(assignment.len(), 2);
    }

    #[test]
    fn test_first_true_candidate_wins() {
        let recipe = Recipe::new(vec![RecipeStep::new("S1", "Heating")]);
        let eligibility = table(&recipe);
        let mut model = ConstraintModel::new("loose");
        let a = model.add_variable("S1", "R1::Heat").unwrap();
        let b = model.add_variable("S1", "R2::Heat").unwrap();
        model
            .add_constraint(Constraint::AtLeastOne {
                step_id: "S1".into(),
                vars: vec![a, b],
            })
            .unwrap();
        model.set_objective(Objective::MaximizeCount(vec![a, b])).unwrap();
        model.seal().unwrap();

        let solution = Solution::new(vec![true, true], 2);
        let assignment = extract_assignment(&model, &eligibility, &solution);
        assert_eq!(assignment.capability_for("S1"), Some("R1::Heat"));
    }

    #[test]
    fn test_uncovered_step_is_left_out() {
        let recipe = Recipe::new(vec![
            RecipeStep::new("S1", "Heating"),
            RecipeStep::new("S2", "Cooling"),
        ]);
        let eligibility = table(&recipe);
        let model = ModelBuilder::new(&recipe, &eligibility, &TransportModes::new())
            .build()
            .unwrap();

        let solution = Solution::new(vec![true, false], 1);
        let assignment = extract_assignment(&model, &eligibility, &solution);
        assert_eq!(assignment.capability_for("S1"), Some("R1::Heat"));
        assert_eq!(assignment.capability_for("S2"), None);
    }
}
