//! Transport-mode classification.
//!
//! Interior steps whose semantic type is a transport type (dosing,
//! conveying, ...) move material, and the direction matters for which
//! devices may carry them out:
//!
//! - **Feed**: brings material into the device that runs the previous step.
//! - **Discharge**: moves material out into the device of the next step.
//! - **Transfer**: connects two other devices.
//!
//! The mode is resolved by an ordered chain; the first rule with a
//! definite answer wins:
//!
//! 1. Explicit `mode` parameter
//! 2. Hints in the step identifier
//! 3. Hints in the parameter names
//! 4. Resource continuity from a previous assignment (second pass only)
//! 5. Transfer
//!
//! Results go into a [`TransportModes`] side table; steps are never
//! modified.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::config::{MatchConfig, ModeHints};
use crate::models::{Assignment, Recipe, RecipeStep};

/// Material-flow role of an interior transport step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Feed,
    Discharge,
    Transfer,
}

impl TransportMode {
    /// Parses a mode name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "feed" => Some(Self::Feed),
            "discharge" => Some(Self::Discharge),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Discharge => "discharge",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule decided a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeSource {
    Explicit,
    IdentifierHint,
    ParameterHint,
    ResourceContinuity,
    Default,
}

/// A resolved mode together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMode {
    pub mode: TransportMode,
    pub source: ModeSource,
}

/// Step id → resolved transport mode, for the steps that have one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportModes {
    modes: BTreeMap<String, ResolvedMode>,
}

impl TransportModes {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mode for a step.
    pub fn insert(&mut self, step_id: impl Into<String>, resolved: ResolvedMode) {
        self.modes.insert(step_id.into(), resolved);
    }

    /// Mode of a step, if it is an interior transport step.
    pub fn mode_of(&self, step_id: &str) -> Option<TransportMode> {
        self.modes.get(step_id).map(|r| r.mode)
    }

    /// Mode and source of a step.
    pub fn resolved(&self, step_id: &str) -> Option<&ResolvedMode> {
        self.modes.get(step_id)
    }

    /// (step id, resolved mode) pairs ordered by step id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedMode)> {
        self.modes.iter().map(|(s, r)| (s.as_str(), r))
    }

    /// Number of classified steps.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Whether no step was classified.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// Resolves transport modes for a recipe.
#[derive(Debug, Clone)]
pub struct TransportClassifier<'a> {
    config: &'a MatchConfig,
    previous: Option<&'a Assignment>,
}

impl<'a> TransportClassifier<'a> {
    /// Creates a classifier without a previous assignment.
    pub fn new(config: &'a MatchConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    /// Enables the resource-continuity rule using a previous assignment.
    pub fn with_assignment(mut self, assignment: &'a Assignment) -> Self {
        self.previous = Some(assignment);
        self
    }

    /// Classifies every interior transport step of the recipe.
    pub fn classify(&self, recipe: &Recipe) -> TransportModes {
        let mut modes = TransportModes::new();
        for (index, step) in recipe.steps().iter().enumerate() {
            if let Some(resolved) = self.classify_step(recipe, index) {
                debug!(
                    step = %step.id,
                    mode = %resolved.mode,
                    source = ?resolved.source,
                    "transport mode resolved"
                );
                modes.insert(step.id.clone(), resolved);
            }
        }
        modes
    }

    /// Classifies the step at `index`.
    ///
    /// Returns `None` for first and last steps and for steps whose type is
    /// not a transport type.
    pub fn classify_step(&self, recipe: &Recipe, index: usize) -> Option<ResolvedMode> {
        if !recipe.is_interior(index) {
            return None;
        }
        let step = recipe.steps().get(index)?;
        if !self.config.is_transport_type(&step.semantic_type) {
            return None;
        }

        let resolved = |mode, source| Some(ResolvedMode { mode, source });

        if let Some(mode) = self.explicit_mode(step) {
            return resolved(mode, ModeSource::Explicit);
        }
        if let Some(mode) = identifier_hint(&step.id, &self.config.identifier_hints) {
            return resolved(mode, ModeSource::IdentifierHint);
        }
        if let Some(mode) = parameter_hint(step, &self.config.parameter_hints) {
            return resolved(mode, ModeSource::ParameterHint);
        }
        if let Some(mode) = self.continuity_mode(recipe, index) {
            return resolved(mode, ModeSource::ResourceContinuity);
        }
        resolved(TransportMode::Transfer, ModeSource::Default)
    }

    fn explicit_mode(&self, step: &RecipeStep) -> Option<TransportMode> {
        step.parameter(&self.config.mode_parameter)
            .and_then(|p| TransportMode::parse(&p.value))
    }

    /// Compares the step's resource with its neighbours' in the previous
    /// assignment. All three must be assigned.
    fn continuity_mode(&self, recipe: &Recipe, index: usize) -> Option<TransportMode> {
        let assignment = self.previous?;
        let current = assignment.resource_for(&recipe.steps().get(index)?.id)?;
        let prev = assignment.resource_for(&recipe.predecessor(index)?.id)?;
        let next = assignment.resource_for(&recipe.successor(index)?.id)?;

        match (current == prev, current == next) {
            (false, true) => Some(TransportMode::Feed),
            (true, false) => Some(TransportMode::Discharge),
            (false, false) => Some(TransportMode::Transfer),
            (true, true) => None,
        }
    }
}

fn identifier_hint(step_id: &str, hints: &ModeHints) -> Option<TransportMode> {
    let id = step_id.to_lowercase();
    let hit = |words: &[String]| words.iter().any(|w| id.contains(&w.to_lowercase()));
    first_hit(hints, hit)
}

fn parameter_hint(step: &RecipeStep, hints: &ModeHints) -> Option<TransportMode> {
    let keys: Vec<String> = step.parameters.iter().map(|p| p.key.to_lowercase()).collect();
    let hit = |words: &[String]| words.iter().any(|w| keys.contains(&w.to_lowercase()));
    first_hit(hints, hit)
}

/// Checks feed, then discharge, then transfer.
fn first_hit(hints: &ModeHints, hit: impl Fn(&[String]) -> bool) -> Option<TransportMode> {
    [
        (TransportMode::Feed, &hints.feed),
        (TransportMode::Discharge, &hints.discharge),
        (TransportMode::Transfer, &hints.transfer),
    ]
    .into_iter()
    .find(|(_, words)| hit(words.as_slice()))
    .map(|(mode, _)| mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with(middle: RecipeStep) -> Recipe {
        Recipe::new(vec![
            RecipeStep::new("Heat", "Heating"),
            middle,
            RecipeStep::new("Mix", "Mixing"),
        ])
    }

    fn classify(middle: RecipeStep) -> Option<ResolvedMode> {
        let config = MatchConfig::default();
        TransportClassifier::new(&config).classify_step(&recipe_with(middle), 1)
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(TransportMode::parse(" Feed "), Some(TransportMode::Feed));
        assert_eq!(TransportMode::parse("DISCHARGE"), Some(TransportMode::Discharge));
        assert_eq!(TransportMode::parse("sideways"), None);
        assert_eq!(TransportMode::Transfer.to_string(), "transfer");
    }

    #[test]
    fn test_non_transport_step_has_no_mode() {
        assert_eq!(classify(RecipeStep::new("S2", "Heating")), None);
    }

    #[test]
    fn test_first_and_last_steps_have_no_mode() {
        let config = MatchConfig::default();
        let recipe = Recipe::new(vec![
            RecipeStep::new("feed_in", "Dosing"),
            RecipeStep::new("S2", "Dosing"),
            RecipeStep::new("feed_out", "Dosing"),
        ]);
        let modes = TransportClassifier::new(&config).classify(&recipe);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes.mode_of("feed_in"), None);
        assert_eq!(modes.mode_of("feed_out"), None);
        assert!(modes.mode_of("S2").is_some());
    }

    #[test]
    fn test_explicit_mode_wins() {
        let r = classify(RecipeStep::new("feed_pump", "Dosing").with_parameter("MODE", "discharge"));
        assert_eq!(
            r,
            Some(ResolvedMode {
                mode: TransportMode::Discharge,
                source: ModeSource::Explicit
            })
        );
    }

    #[test]
    fn test_unknown_explicit_mode_falls_through() {
        let r = classify(RecipeStep::new("outlet_1", "Dosing").with_parameter("mode", "fast")).unwrap();
        assert_eq!(r.mode, TransportMode::Discharge);
        assert_eq!(r.source, ModeSource::IdentifierHint);
    }

    #[test]
    fn test_identifier_hints() {
        let cases = [
            ("InletPump", TransportMode::Feed),
            ("product_output", TransportMode::Discharge),
            ("MoveToTank", TransportMode::Transfer),
            ("Dosing2", TransportMode::Transfer),
        ];
        for (id, expected) in cases {
            let r = classify(RecipeStep::new(id, "Transporting")).unwrap();
            assert_eq!(r.mode, expected, "step {id}");
            assert_eq!(r.source, ModeSource::IdentifierHint);
        }
    }

    #[test]
    fn test_parameter_hints() {
        let r = classify(RecipeStep::new("S2", "Conveying").with_parameter("FeedRate", "5")).unwrap();
        assert_eq!(r.mode, TransportMode::Feed);
        assert_eq!(r.source, ModeSource::ParameterHint);

        let r = classify(RecipeStep::new("S2", "Conveying").with_parameter("discharge_flow", "5")).unwrap();
        assert_eq!(r.mode, TransportMode::Discharge);

        let r = classify(RecipeStep::new("S2", "Conveying").with_parameter("conveyorSpeed", "1")).unwrap();
        assert_eq!(r.mode, TransportMode::Transfer);
    }

    #[test]
    fn test_default_is_transfer() {
        let r = classify(RecipeStep::new("S2", "Dosing").with_parameter("volume", "10")).unwrap();
        assert_eq!(r.mode, TransportMode::Transfer);
        assert_eq!(r.source, ModeSource::Default);
    }

    #[test]
    fn test_resource_continuity() {
        let config = MatchConfig::default();
        let recipe = recipe_with(RecipeStep::new("S2", "Dosing"));
        let cases = [
            (("A", "B", "B"), Some(TransportMode::Feed)),
            (("A", "A", "B"), Some(TransportMode::Discharge)),
            (("A", "B", "C"), Some(TransportMode::Transfer)),
        ];
        for ((prev, cur, next), expected) in cases {
            let assignment = Assignment::new()
                .with("Heat", format!("{prev}::x"))
                .with("S2", format!("{cur}::y"))
                .with("Mix", format!("{next}::z"));
            let r = TransportClassifier::new(&config)
                .with_assignment(&assignment)
                .classify_step(&recipe, 1)
                .unwrap();
            assert_eq!(Some(r.mode), expected, "{prev}/{cur}/{next}");
            assert_eq!(r.source, ModeSource::ResourceContinuity);
        }
    }

    #[test]
    fn test_continuity_same_resource_everywhere_defaults() {
        let config = MatchConfig::default();
        let recipe = recipe_with(RecipeStep::new("S2", "Dosing"));
        let assignment = Assignment::new()
            .with("Heat", "A::x")
            .with("S2", "A::y")
            .with("Mix", "A::z");
        let r = TransportClassifier::new(&config)
            .with_assignment(&assignment)
            .classify_step(&recipe, 1)
            .unwrap();
        assert_eq!(r.source, ModeSource::Default);
    }

    #[test]
    fn test_continuity_needs_all_three_assigned() {
        let config = MatchConfig::default();
        let recipe = recipe_with(RecipeStep::new("S2", "Dosing"));
        let assignment = Assignment::new().with("Heat", "A::x").with("S2", "B::y");
        let r = TransportClassifier::new(&config)
            .with_assignment(&assignment)
            .classify_step(&recipe, 1)
            .unwrap();
        assert_eq!(r.source, ModeSource::Default);
    }
}
