//! Capability model.
//!
//! A capability is a declared skill of a resource (an equipment unit):
//! a semantic type, its ancestor types, and the parameter ranges the
//! resource can satisfy. Capabilities are built once from a
//! [`CapabilityDocument`] and never change afterwards.
//!
//! # Identifiers
//! A capability id is `"<resource>::<capability name>"`. The resource part
//! drives transport-continuity rules, so it is kept as a separate field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::{eq_ignore_case, CapabilityDocument, CapabilityEntry, PropertyDeclaration};
use crate::hierarchy::SemanticHierarchy;

/// Separator between resource and capability name in a capability id.
pub const ID_SEPARATOR: &str = "::";

/// Inclusive numeric interval; either bound may be open.
///
/// `low <= high` is not enforced. An inverted range simply never matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl ParameterRange {
    /// Creates a range.
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    /// Closed range `[low, high]`.
    pub fn closed(low: f64, high: f64) -> Self {
        Self::new(Some(low), Some(high))
    }
}

/// A capability offered by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Unique identifier: `resource::name`.
    pub id: String,
    /// Owning resource.
    pub resource: String,
    /// Capability name.
    pub name: String,
    /// Declared semantic type.
    pub semantic_type: String,
    /// The semantic type and all its transitive generalizations.
    pub ancestors: Vec<String>,
    /// Parameter identifier → supported range.
    pub parameters: BTreeMap<String, ParameterRange>,
    /// Devices or skills realizing this capability (informational).
    pub realized_by: Vec<String>,
}

impl Capability {
    /// Creates a capability whose ancestor set is only its own type.
    pub fn new(
        resource: impl Into<String>,
        name: impl Into<String>,
        semantic_type: impl Into<String>,
    ) -> Self {
        let resource = resource.into();
        let name = name.into();
        let semantic_type = semantic_type.into();
        Self {
            id: capability_id(&resource, &name),
            resource,
            name,
            ancestors: vec![semantic_type.clone()],
            semantic_type,
            parameters: BTreeMap::new(),
            realized_by: Vec::new(),
        }
    }

    /// Adds a parameter range.
    pub fn with_parameter(mut self, key: impl Into<String>, range: ParameterRange) -> Self {
        self.parameters.insert(key.into(), range);
        self
    }

    /// Replaces the ancestor set with the closure from `hierarchy`.
    pub fn with_hierarchy(mut self, hierarchy: &SemanticHierarchy) -> Self {
        self.ancestors = hierarchy.ancestors(&self.semantic_type);
        self
    }

    /// Normalizes a raw document entry.
    ///
    /// Returns `None` when the entry declares no capability at all.
    /// Properties without an identifier, or with a bound that is not a
    /// number, are left out of the parameter map.
    pub fn from_entry(
        resource: &str,
        entry: &CapabilityEntry,
        hierarchy: &SemanticHierarchy,
    ) -> Option<Self> {
        let name = entry.name()?;
        let semantic_type = entry.semantic_type()?;

        let mut capability = Self::new(resource, name, semantic_type).with_hierarchy(hierarchy);
        capability.realized_by = entry.realized_by.clone();

        for property in &entry.properties {
            let Some(pid) = property.property_id.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            match normalize_range(property) {
                Some(range) => {
                    capability.parameters.insert(pid.to_string(), range);
                }
                None => warn!(
                    capability = %capability.id,
                    parameter = pid,
                    "dropping parameter with non-numeric bound"
                ),
            }
        }

        Some(capability)
    }

    /// Whether the capability's type chain contains `semantic_type`
    /// (case-insensitive).
    pub fn has_type(&self, semantic_type: &str) -> bool {
        self.ancestors
            .iter()
            .any(|t| eq_ignore_case(t, semantic_type))
    }
}

/// Builds a capability id from its parts.
pub fn capability_id(resource: &str, name: &str) -> String {
    format!("{resource}{ID_SEPARATOR}{name}")
}

/// Resource part of a capability id (the whole id if it has no separator).
pub fn resource_of(capability_id: &str) -> &str {
    capability_id
        .split_once(ID_SEPARATOR)
        .map(|(resource, _)| resource)
        .unwrap_or(capability_id)
}

/// Low bound from `valueMin` else `value0`, high from `valueMax` else
/// `value1`. `None` if a present bound does not parse.
fn normalize_range(property: &PropertyDeclaration) -> Option<ParameterRange> {
    let low = property.value_min.as_ref().or(property.value0.as_ref());
    let high = property.value_max.as_ref().or(property.value1.as_ref());
    let low = match low {
        Some(raw) => Some(raw.as_f64()?),
        None => None,
    };
    let high = match high {
        Some(raw) => Some(raw.as_f64()?),
        None => None,
    };
    Some(ParameterRange::new(low, high))
}

/// The set of capabilities available to a run.
///
/// Capabilities are kept in catalog order: resources by ascending name,
/// then entries in declaration order. This order determines the order of
/// valid candidates and therefore the solver's variable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityCatalog {
    capabilities: Vec<Capability>,
    hierarchy: SemanticHierarchy,
}

impl CapabilityCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the catalog from a capability document.
    ///
    /// The semantic hierarchy is collected from all entries first, then
    /// every entry is normalized against it.
    pub fn from_document(doc: &CapabilityDocument) -> Self {
        let hierarchy = SemanticHierarchy::from_document(doc);
        let capabilities = doc
            .resources
            .iter()
            .flat_map(|(resource, entries)| {
                entries
                    .iter()
                    .filter_map(|entry| Capability::from_entry(resource, entry, &hierarchy))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            capabilities,
            hierarchy,
        }
    }

    /// Sets the hierarchy and recomputes every capability's ancestors.
    pub fn with_hierarchy(mut self, hierarchy: SemanticHierarchy) -> Self {
        for cap in &mut self.capabilities {
            cap.ancestors = hierarchy.ancestors(&cap.semantic_type);
        }
        self.hierarchy = hierarchy;
        self
    }

    /// Adds a capability; its ancestors are resolved against the catalog
    /// hierarchy.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        let capability = capability.with_hierarchy(&self.hierarchy);
        self.capabilities.push(capability);
        self
    }

    /// Capabilities in catalog order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// The semantic hierarchy the catalog was built with.
    pub fn hierarchy(&self) -> &SemanticHierarchy {
        &self.hierarchy
    }

    /// Looks up a capability by id.
    pub fn get(&self, id: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    /// Number of capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapabilityDeclaration, RawValue};

    fn property(id: Option<&str>) -> PropertyDeclaration {
        PropertyDeclaration {
            property_id: id.map(String::from),
            ..Default::default()
        }
    }

    fn entry(name: &str, iri: Option<&str>, parents: &[&str]) -> CapabilityEntry {
        CapabilityEntry {
            capability: vec![CapabilityDeclaration {
                capability_name: name.into(),
                capability_id: iri.map(String::from),
            }],
            generalized_by: parents.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_capability_ids() {
        let cap = Capability::new("R1", "Heat", "HeatingProcess");
        assert_eq!(cap.id, "R1::Heat");
        assert_eq!(resource_of(&cap.id), "R1");
        assert_eq!(resource_of("plain"), "plain");
        assert_eq!(cap.ancestors, vec!["HeatingProcess"]);
    }

    #[test]
    fn test_normalize_prefers_min_max() {
        let mut p = property(Some("temp"));
        p.value_min = Some(RawValue::from(20.0));
        p.value0 = Some(RawValue::from(0.0));
        p.value1 = Some(RawValue::from("100"));
        assert_eq!(normalize_range(&p), Some(ParameterRange::closed(20.0, 100.0)));
    }

    #[test]
    fn test_normalize_open_bounds() {
        let mut p = property(Some("temp"));
        p.value_max = Some(RawValue::from(80.0));
        assert_eq!(normalize_range(&p), Some(ParameterRange::new(None, Some(80.0))));
    }

    #[test]
    fn test_normalize_drops_non_numeric() {
        let mut p = property(Some("temp"));
        p.value_min = Some(RawValue::from("cold"));
        p.value_max = Some(RawValue::from(80.0));
        assert_eq!(normalize_range(&p), None);
    }

    #[test]
    fn test_from_entry_skips_unusable_properties() {
        let mut e = entry("Heat", Some("x#HeatingProcess"), &[]);
        let mut temp = property(Some("temp"));
        temp.value_min = Some(RawValue::from(20.0));
        temp.value_max = Some(RawValue::from(100.0));
        let mut broken = property(Some("pressure"));
        broken.value_min = Some(RawValue::from("n/a"));
        let mut anonymous = property(None);
        anonymous.value_min = Some(RawValue::from(1.0));
        e.properties = vec![temp, broken, anonymous];

        let cap = Capability::from_entry("R1", &e, &SemanticHierarchy::new()).unwrap();
        assert_eq!(cap.semantic_type, "HeatingProcess");
        assert_eq!(cap.parameters.len(), 1);
        assert_eq!(cap.parameters["temp"], ParameterRange::closed(20.0, 100.0));
    }

    #[test]
    fn test_from_entry_without_declaration() {
        let e = CapabilityEntry::default();
        assert!(Capability::from_entry("R1", &e, &SemanticHierarchy::new()).is_none());
    }

    #[test]
    fn test_catalog_from_document() {
        let mut doc = CapabilityDocument::default();
        doc.resources.insert(
            "Reactor".into(),
            vec![
                entry("Heat", Some("x#HeatingProcess"), &["ThermalProcess"]),
                entry("Stir", None, &["MixingProcess"]),
            ],
        );
        doc.resources
            .insert("Pump".into(), vec![entry("Dose", Some("x#Dosing"), &[])]);

        let catalog = CapabilityCatalog::from_document(&doc);
        let ids: Vec<&str> = catalog.capabilities().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Pump::Dose", "Reactor::Heat", "Reactor::Stir"]);

        let heat = catalog.get("Reactor::Heat").unwrap();
        assert!(heat.has_type("thermalprocess"));
        assert!(heat.has_type("HeatingProcess"));
        assert!(!heat.has_type("Dosing"));

        let stir = catalog.get("Reactor::Stir").unwrap();
        assert_eq!(stir.semantic_type, "Stir");
        assert!(stir.has_type("MixingProcess"));
    }

    #[test]
    fn test_has_type_folds_non_ascii_case() {
        let cap = Capability::new("Filler", "Fill", "Füllen");
        assert!(cap.has_type("FÜLLEN"));
        assert!(cap.has_type("füllen"));
        assert!(!cap.has_type("Fullen"));
    }

    #[test]
    fn test_catalog_builder_resolves_ancestors() {
        let catalog = CapabilityCatalog::new()
            .with_hierarchy(SemanticHierarchy::new().with_parents("Heating", &["Thermal"]))
            .with_capability(Capability::new("R1", "Heat", "Heating"));
        assert!(catalog.capabilities()[0].has_type("Thermal"));
        assert_eq!(catalog.len(), 1);
    }
}
