//! Capability matching domain models.
//!
//! Provides the data types on both sides of the matching problem and its
//! solution. Applicable to batch plants, lab automation cells, and any
//! plant whose equipment publishes typed capabilities.
//!
//! # Domain Mappings
//!
//! | u-capmatch | Batch plant | Lab automation | Packaging line |
//! |------------|-------------|----------------|----------------|
//! | Capability | Unit procedure skill | Instrument method | Station function |
//! | RecipeStep | Process step | Protocol step | Operation |
//! | Resource | Vessel/Pump | Instrument | Station |
//! | Assignment | Control recipe binding | Run plan | Line plan |

mod assignment;
mod capability;
mod document;
mod recipe;
mod requirement;

pub use assignment::Assignment;
pub use capability::{
    capability_id, resource_of, Capability, CapabilityCatalog, ParameterRange, ID_SEPARATOR,
};
pub use document::{
    semantic_fragment, CapabilityDeclaration, CapabilityDocument, CapabilityEntry,
    ProcessElement, ProcessParameter, PropertyDeclaration, RawValue, RecipeDocument,
};
pub use recipe::{Recipe, RecipeStep, StepParameter};
pub use requirement::{RangeViolation, Requirement};

/// Case-insensitive text comparison with Unicode lower-casing.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
