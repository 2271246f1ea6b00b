//! Capability matching for process recipes.
//!
//! Decides which equipment capability carries out each step of a
//! sequential recipe. A capability is admissible for a step when its
//! semantic type (or one of its generalizations) equals the step's type
//! and every parameter the step demands lies inside the capability's
//! declared range. Interior transport steps add material-flow continuity
//! between neighbouring steps. The admissible choices are compiled into a
//! boolean model and handed to a pluggable solving oracle.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Capability`, `CapabilityCatalog`,
//!   `Recipe`, `RecipeStep`, `Requirement`, `Assignment`, and the serde
//!   mirrors of the input documents
//! - **`hierarchy`**: Semantic generalization graph and ancestor closure
//! - **`eligibility`**: Valid/invalid classification with rejection reasons
//! - **`transport`**: Feed / discharge / transfer resolution
//! - **`cp`**: Selection model, oracle interface, reference oracle,
//!   solution extraction
//! - **`engine`**: The full pipeline
//! - **`validation`**: Input integrity checks (duplicate and empty IDs)
//! - **`config`**: Vocabularies and oracle limits
//!
//! # Example
//!
//! ```
//! use u_capmatch::{MatchEngine, MatchOutcome};
//! use u_capmatch::models::{Capability, CapabilityCatalog, ParameterRange, Recipe, RecipeStep};
//!
//! let catalog = CapabilityCatalog::new().with_capability(
//!     Capability::new("R1", "Heat", "HeatingProcess")
//!         .with_parameter("temp", ParameterRange::closed(20.0, 100.0)),
//! );
//! let recipe = Recipe::new(vec![
//!     RecipeStep::new("S1", "HeatingProcess").with_parameter("temp", ">=150"),
//! ]);
//!
//! let report = MatchEngine::new().run(&catalog, &recipe).unwrap();
//! assert_eq!(
//!     report.outcome,
//!     MatchOutcome::Unsatisfiable { uncovered: vec!["S1".to_string()] }
//! );
//! ```
//!
//! # References
//!
//! - IEC 61512 (ISA-88), "Batch control"
//! - Köcher et al. (2020), "A formal capability and skill model for use in
//!   plug and produce scenarios"
//! - Biere et al. (2009), "Handbook of Satisfiability"

pub mod config;
pub mod cp;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod transport;
pub mod validation;

pub use config::MatchConfig;
pub use engine::{MatchEngine, MatchOutcome, MatchReport};
pub use error::{MatchError, Result};
