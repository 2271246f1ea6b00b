//! Eligibility filtering.
//!
//! Decides, for every recipe step, which capabilities may be assigned to
//! it. Each capability goes through three ordered checks; the first two
//! stop at the first failing check, the range check collects every
//! violated parameter:
//!
//! 1. **Semantic**: the step type is in the capability's ancestor chain.
//! 2. **Coverage**: every required parameter exists on the capability.
//! 3. **Range**: every requirement overlaps the capability's range.
//!
//! Rejections are kept with their reasons because operators need to see
//! why a device was not considered, especially when a step ends up with
//! no candidate at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::config::MatchConfig;
use crate::models::{
    eq_ignore_case, Capability, CapabilityCatalog, RangeViolation, Recipe, RecipeStep, Requirement,
};

/// Why a capability was rejected for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The step type is not in the capability's type chain.
    SemanticMismatch {
        required: String,
        ancestors: Vec<String>,
    },
    /// The capability does not declare a required parameter.
    MissingParameter { key: String },
    /// A declared range cannot satisfy the requirement.
    OutOfRange(RangeViolation),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::SemanticMismatch {
                required,
                ancestors,
            } => write!(
                f,
                "Semantic type mismatch: need {required}, capability type chain: {}",
                ancestors.join(", ")
            ),
            RejectionReason::MissingParameter { key } => write!(f, "Missing parameter: {key}"),
            RejectionReason::OutOfRange(violation) => write!(f, "{violation}"),
        }
    }
}

/// Eligibility of the whole catalog for one step.
///
/// `valid` and the keys of `invalid` are disjoint and together cover the
/// catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRecord {
    /// Step this record belongs to.
    pub step_id: String,
    /// Admissible capability ids, in catalog order.
    pub valid: Vec<String>,
    /// Rejected capability id → reasons.
    pub invalid: BTreeMap<String, Vec<RejectionReason>>,
}

impl EligibilityRecord {
    /// Whether at least one capability is admissible.
    pub fn is_covered(&self) -> bool {
        !self.valid.is_empty()
    }

    /// Whether `capability_id` is admissible.
    pub fn is_valid(&self, capability_id: &str) -> bool {
        self.valid.iter().any(|c| c == capability_id)
    }

    /// Rejection reasons of a capability (empty if valid or unknown).
    pub fn reasons(&self, capability_id: &str) -> &[RejectionReason] {
        self.invalid
            .get(capability_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Eligibility records for every step, in recipe order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityTable {
    records: Vec<EligibilityRecord>,
}

impl EligibilityTable {
    /// Records in recipe order.
    pub fn records(&self) -> &[EligibilityRecord] {
        &self.records
    }

    /// Record of a step.
    pub fn record(&self, step_id: &str) -> Option<&EligibilityRecord> {
        self.records.iter().find(|r| r.step_id == step_id)
    }

    /// Admissible capabilities of a step (empty if unknown).
    pub fn valid_for(&self, step_id: &str) -> &[String] {
        self.record(step_id)
            .map(|r| r.valid.as_slice())
            .unwrap_or(&[])
    }

    /// Steps without any admissible capability.
    ///
    /// Any such step makes the assignment model unsatisfiable; this is the
    /// place to find out which steps caused it.
    pub fn uncovered_steps(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| !r.is_covered())
            .map(|r| r.step_id.as_str())
            .collect()
    }
}

/// Classifies capabilities as valid or invalid per step.
#[derive(Debug, Clone)]
pub struct EligibilityFilter<'a> {
    config: &'a MatchConfig,
}

impl<'a> EligibilityFilter<'a> {
    /// Creates a filter using the given configuration.
    pub fn new(config: &'a MatchConfig) -> Self {
        Self { config }
    }

    /// Evaluates every step of the recipe against the whole catalog.
    pub fn evaluate(&self, catalog: &CapabilityCatalog, recipe: &Recipe) -> EligibilityTable {
        let records = recipe
            .steps()
            .iter()
            .map(|step| self.evaluate_step(catalog, step))
            .collect();
        EligibilityTable { records }
    }

    /// Evaluates one step against the whole catalog.
    pub fn evaluate_step(&self, catalog: &CapabilityCatalog, step: &RecipeStep) -> EligibilityRecord {
        let requirements = self.requirements(step);
        let mut record = EligibilityRecord {
            step_id: step.id.clone(),
            ..Default::default()
        };

        for cap in catalog.capabilities() {
            let reasons = Self::check(step, cap, &requirements);
            if reasons.is_empty() {
                record.valid.push(cap.id.clone());
            } else {
                trace!(step = %step.id, capability = %cap.id, ?reasons, "rejected");
                record.invalid.insert(cap.id.clone(), reasons);
            }
        }

        debug!(
            step = %step.id,
            valid = record.valid.len(),
            invalid = record.invalid.len(),
            "eligibility evaluated"
        );
        record
    }

    /// Requirement keys of a step with their parsed demand.
    ///
    /// The mode directive of a transport step is not a requirement. A value
    /// that does not parse demands nothing numeric, but the key must still
    /// be covered.
    fn requirements<'s>(&self, step: &'s RecipeStep) -> Vec<(&'s str, Option<Requirement>)> {
        let is_transport = self.config.is_transport_type(&step.semantic_type);
        step.parameters
            .iter()
            .filter(|p| !(is_transport && eq_ignore_case(&p.key, &self.config.mode_parameter)))
            .map(|p| {
                let demand = Requirement::parse(&p.value);
                if demand.is_none() {
                    warn!(
                        step = %step.id,
                        parameter = %p.key,
                        value = %p.value,
                        "unparseable requirement, treating as unbounded"
                    );
                }
                (p.key.as_str(), demand)
            })
            .collect()
    }

    fn check(
        step: &RecipeStep,
        cap: &Capability,
        requirements: &[(&str, Option<Requirement>)],
    ) -> Vec<RejectionReason> {
        if !cap.has_type(&step.semantic_type) {
            return vec![RejectionReason::SemanticMismatch {
                required: step.semantic_type.clone(),
                ancestors: cap.ancestors.clone(),
            }];
        }

        let missing: Vec<RejectionReason> = requirements
            .iter()
            .filter(|(key, _)| !cap.parameters.contains_key(*key))
            .map(|(key, _)| RejectionReason::MissingParameter {
                key: key.to_string(),
            })
            .collect();
        if !missing.is_empty() {
            return missing;
        }

        requirements
            .iter()
            .filter_map(|(key, demand)| Some((key, (*demand)?, cap.parameters.get(*key)?)))
            .flat_map(|(key, demand, range)| demand.check(key, range))
            .map(RejectionReason::OutOfRange)
            .collect()
    }
}
