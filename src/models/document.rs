//! Input document model.
//!
//! Serde mirrors of the capability catalog and recipe documents as they
//! are exchanged between engineering tools. Field names follow the
//! documents (`capability_ID`, `ProcessElements`, ...), not Rust naming.
//!
//! The crate never reads files: callers deserialize these types with the
//! serde format of their choice and hand them over.
//!
//! # Semantic identifiers
//!
//! Semantic references are IRIs such as
//! `http://example.org/process#HeatingProcess`. Only the fragment after
//! the last `#` takes part in matching; see [`semantic_fragment`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{RecipeStep, StepParameter};

/// Capability catalog: resource name → declared capability entries.
///
/// A `BTreeMap` so that resources are always visited in ascending name
/// order, independent of how the source document was ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityDocument {
    pub resources: BTreeMap<String, Vec<CapabilityEntry>>,
}

/// One capability declaration block of a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    /// Declared capabilities; the first one names the entry.
    #[serde(default)]
    pub capability: Vec<CapabilityDeclaration>,
    /// Direct generalizations (parent semantic types).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub generalized_by: Vec<String>,
    /// Parameter properties with their bounds.
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    /// Skills or devices realizing this capability (informational).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub realized_by: Vec<String>,
}

/// Name and semantic identifier of a capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDeclaration {
    pub capability_name: String,
    #[serde(rename = "capability_ID", default, skip_serializing_if = "Option::is_none")]
    pub capability_id: Option<String>,
}

/// A parameter property with optional bounds.
///
/// `valueMin`/`valueMax` are preferred; `value0`/`value1` are the
/// fallbacks some tools emit instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    #[serde(rename = "property_ID", default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(rename = "valueMin", default, skip_serializing_if = "Option::is_none")]
    pub value_min: Option<RawValue>,
    #[serde(rename = "valueMax", default, skip_serializing_if = "Option::is_none")]
    pub value_max: Option<RawValue>,
    #[serde(rename = "value0", default, skip_serializing_if = "Option::is_none")]
    pub value0: Option<RawValue>,
    #[serde(rename = "value1", default, skip_serializing_if = "Option::is_none")]
    pub value1: Option<RawValue>,
}

/// A bound as written in the document: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric value, if the raw value parses as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            RawValue::Number(_) => None,
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Recipe document: an ordered list of process elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeDocument {
    #[serde(rename = "ProcessElements", default)]
    pub process_elements: Vec<ProcessElement>,
}

/// One recipe step as declared in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessElement {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "SemanticDescription", default)]
    pub semantic_description: String,
    #[serde(rename = "Parameters", default)]
    pub parameters: Vec<ProcessParameter>,
}

/// A key/value requirement of a process element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameter {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "ValueString", default)]
    pub value_string: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "UnitOfMeasure", default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
}

impl CapabilityEntry {
    /// Name of the entry (first declared capability), if any.
    pub fn name(&self) -> Option<&str> {
        self.capability.first().map(|c| c.capability_name.as_str())
    }

    /// Semantic type of the entry.
    ///
    /// The fragment of `capability_ID` when it carries one, otherwise the
    /// capability name.
    pub fn semantic_type(&self) -> Option<String> {
        let decl = self.capability.first()?;
        match decl.capability_id.as_deref() {
            Some(iri) if iri.contains('#') => Some(semantic_fragment(iri).to_string()),
            _ => Some(decl.capability_name.clone()),
        }
    }
}

impl RecipeDocument {
    /// Converts the process elements into recipe steps, keeping document order.
    pub fn into_steps(self) -> Vec<RecipeStep> {
        self.process_elements
            .into_iter()
            .map(ProcessElement::into_step)
            .collect()
    }
}

impl ProcessElement {
    /// Converts this element into a [`RecipeStep`].
    pub fn into_step(self) -> RecipeStep {
        let semantic_type = semantic_fragment(&self.semantic_description).to_string();
        let parameters = self
            .parameters
            .into_iter()
            .map(|p| {
                let mut param = StepParameter::new(p.key, p.value_string);
                param.unit = p.unit_of_measure;
                param
            })
            .collect();
        RecipeStep {
            id: self.id,
            semantic_type,
            parameters,
        }
    }
}

/// Returns the fragment after the last `#`, or the whole string.
pub fn semantic_fragment(iri: &str) -> &str {
    iri.rsplit('#').next().unwrap_or(iri)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
