//! Recipe model.
//!
//! A recipe is a strictly linear sequence of process steps. Step order is
//! significant: transport steps are constrained by their immediate
//! neighbours.

use serde::{Deserialize, Serialize};

use super::eq_ignore_case;

/// A key/value requirement of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepParameter {
    /// Parameter identifier, matched against capability parameter ids.
    pub key: String,
    /// Requirement string (e.g. `"50"`, `">=150"`, `"2-4"`).
    pub value: String,
    /// Unit of measure as declared (informational).
    pub unit: Option<String>,
}

impl StepParameter {
    /// Creates a parameter without unit.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            unit: None,
        }
    }
}

/// A process step of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    /// Unique step identifier.
    pub id: String,
    /// Semantic type the assigned capability must implement.
    pub semantic_type: String,
    /// Requirements in declaration order.
    pub parameters: Vec<StepParameter>,
}

impl RecipeStep {
    /// Creates a step without parameters.
    pub fn new(id: impl Into<String>, semantic_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            semantic_type: semantic_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(StepParameter::new(key, value));
        self
    }

    /// Looks up a parameter by key, ignoring ASCII case.
    pub fn parameter(&self, key: &str) -> Option<&StepParameter> {
        self.parameters
            .iter()
            .find(|p| eq_ignore_case(&p.key, key))
    }
}

/// An ordered sequence of recipe steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    steps: Vec<RecipeStep>,
}

impl Recipe {
    /// Creates a recipe from steps in execution order.
    pub fn new(steps: Vec<RecipeStep>) -> Self {
        Self { steps }
    }

    /// Appends a step.
    pub fn with_step(mut self, step: RecipeStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the recipe has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of a step by id.
    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// The step right before `index`.
    pub fn predecessor(&self, index: usize) -> Option<&RecipeStep> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// The step right after `index`.
    pub fn successor(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index + 1)
    }

    /// Whether `index` is neither the first nor the last step.
    pub fn is_interior(&self, index: usize) -> bool {
        index > 0 && index + 1 < self.steps.len()
    }
}

impl From<Vec<RecipeStep>> for Recipe {
    fn from(steps: Vec<RecipeStep>) -> Self {
        Self::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_steps() -> Recipe {
        Recipe::new(vec![
            RecipeStep::new("S1", "Heating"),
            RecipeStep::new("S2", "Dosing").with_parameter("Mode", "feed"),
            RecipeStep::new("S3", "Mixing"),
        ])
    }

    #[test]
    fn test_neighbours() {
        let r = three_steps();
        assert!(r.predecessor(0).is_none());
        assert_eq!(r.predecessor(1).unwrap().id, "S1");
        assert_eq!(r.successor(1).unwrap().id, "S3");
        assert!(r.successor(2).is_none());
        assert_eq!(r.position("S3"), Some(2));
        assert_eq!(r.position("S9"), None);
    }

    #[test]
    fn test_interior() {
        let r = three_steps();
        assert!(!r.is_interior(0));
        assert!(r.is_interior(1));
        assert!(!r.is_interior(2));
        assert!(!Recipe::new(vec![RecipeStep::new("S1", "x")]).is_interior(0));
    }

    #[test]
    fn test_parameter_lookup_ignores_case() {
        let r = three_steps();
        let step = &r.steps()[1];
        assert_eq!(step.parameter("mode").unwrap().value, "feed");
        assert!(step.parameter("speed").is_none());

        let step = RecipeStep::new("S4", "Heating").with_parameter("Öltemperatur", "80");
        assert_eq!(step.parameter("ÖLTEMPERATUR").unwrap().value, "80");
    }
}
