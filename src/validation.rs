//! Input validation for matching problems.
//!
//! Checks structural integrity of the capability catalog and the recipe
//! before a model is built. Detects:
//! - Duplicate capability IDs
//! - Duplicate step IDs
//! - Empty identifiers
//!
//! Selection variables are keyed by (step id, capability id), so any of
//! these would make two variables indistinguishable.

use crate::models::{CapabilityCatalog, Recipe};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A step or capability has an empty identifier.
    EmptyIdentifier,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a matching run.
///
/// Checks:
/// 1. No duplicate capability IDs
/// 2. No capability with an empty resource or name
/// 3. No duplicate step IDs
/// 4. No step with an empty ID
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(catalog: &CapabilityCatalog, recipe: &Recipe) -> ValidationResult {
    let mut errors = Vec::new();

    let mut capability_ids = HashSet::new();
    for cap in catalog.capabilities() {
        if cap.resource.is_empty() || cap.name.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyIdentifier,
                format!("Capability '{}' has an empty resource or name", cap.id),
            ));
        }
        if !capability_ids.insert(cap.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate capability ID: {}", cap.id),
            ));
        }
    }

    let mut step_ids = HashSet::new();
    for (index, step) in recipe.steps().iter().enumerate() {
        if step.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyIdentifier,
                format!("Step at position {index} has an empty ID"),
            ));
            continue;
        }
        if !step_ids.insert(step.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate step ID: {}", step.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
