//! Semantic type hierarchy.
//!
//! Capability declarations name their direct generalizations
//! (`generalized_by`). This module keeps the resulting type → parents
//! graph and answers ancestor queries over it.
//!
//! The graph may have several parents per type and is not guaranteed to
//! be acyclic. Ancestor resolution is an iterative worklist with a visited
//! set, so diamonds are reported once and cycles terminate.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::CapabilityDocument;

/// Type → direct parent types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticHierarchy {
    parents: HashMap<String, Vec<String>>,
}

impl SemanticHierarchy {
    /// Creates an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the hierarchy from every entry of a capability document.
    ///
    /// When several entries declare the same semantic type, the entry
    /// visited last wins.
    pub fn from_document(doc: &CapabilityDocument) -> Self {
        let mut hierarchy = Self::new();
        for entries in doc.resources.values() {
            for entry in entries {
                if let Some(semantic_type) = entry.semantic_type() {
                    hierarchy.declare(semantic_type, entry.generalized_by.clone());
                }
            }
        }
        hierarchy
    }

    /// Records `parents` as the direct parents of `semantic_type`,
    /// replacing any earlier declaration.
    pub fn declare(&mut self, semantic_type: impl Into<String>, parents: Vec<String>) {
        self.parents.insert(semantic_type.into(), parents);
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with_parents(mut self, semantic_type: impl Into<String>, parents: &[&str]) -> Self {
        self.declare(
            semantic_type,
            parents.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Direct parents of a type (empty if undeclared).
    pub fn parents(&self, semantic_type: &str) -> &[String] {
        self.parents
            .get(semantic_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether no type has been declared.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// All ancestors of `semantic_type`, including itself.
    ///
    /// The type comes first, followed by ancestors in discovery order.
    /// Each type appears once.
    pub fn ancestors(&self, semantic_type: &str) -> Vec<String> {
        let mut ancestors = vec![semantic_type.to_string()];
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(semantic_type);
        let mut worklist = vec![semantic_type];

        while let Some(current) = worklist.pop() {
            for parent in self.parents(current) {
                if visited.insert(parent.as_str()) {
                    ancestors.push(parent.clone());
                    worklist.push(parent.as_str());
                }
            }
        }

        ancestors
    }

    /// Whether `ancestor` generalizes `semantic_type` (reflexive).
    pub fn is_a(&self, semantic_type: &str, ancestor: &str) -> bool {
        self.ancestors(semantic_type).iter().any(|t| t == ancestor)
    }
}
