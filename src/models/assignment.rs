//! Assignment (solution) model.
//!
//! The solved output of a run: for each step, at most one selected
//! capability.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::resource_of;

/// Step id → selected capability id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    selected: BTreeMap<String, String>,
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the capability selected for a step, replacing any earlier one.
    pub fn assign(&mut self, step_id: impl Into<String>, capability_id: impl Into<String>) {
        self.selected.insert(step_id.into(), capability_id.into());
    }

    /// Builder form of [`assign`](Self::assign).
    pub fn with(mut self, step_id: impl Into<String>, capability_id: impl Into<String>) -> Self {
        self.assign(step_id, capability_id);
        self
    }

    /// Capability selected for a step.
    pub fn capability_for(&self, step_id: &str) -> Option<&str> {
        self.selected.get(step_id).map(String::as_str)
    }

    /// Resource of the capability selected for a step.
    pub fn resource_for(&self, step_id: &str) -> Option<&str> {
        self.capability_for(step_id).map(resource_of)
    }

    /// Steps assigned to capabilities of `resource`.
    pub fn steps_on_resource<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a str> {
        self.selected
            .iter()
            .filter(move |(_, cap)| resource_of(cap) == resource)
            .map(|(step, _)| step.as_str())
    }

    /// (step id, capability id) pairs, ordered by step id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.selected.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }

    /// Number of assigned steps.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
