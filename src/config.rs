//! Matching configuration.
//!
//! Vocabulary used by the transport-mode classifier and the limits given
//! to the solving oracle. Defaults reproduce the plant vocabulary the
//! engine was built for; every list can be replaced per run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::eq_ignore_case;

/// Default oracle time limit (ms).
pub const DEFAULT_TIME_LIMIT_MS: u64 = 30_000;

/// Configuration of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Semantic types (lower-case) treated as transport steps.
    pub transport_types: Vec<String>,
    /// Name of the step parameter that declares a mode explicitly.
    pub mode_parameter: String,
    /// Substrings of step identifiers hinting at a mode.
    pub identifier_hints: ModeHints,
    /// Parameter keys (lower-case) hinting at a mode.
    pub parameter_hints: ModeHints,
    /// Wall-clock limit for one oracle call (ms). `None` = unbounded.
    pub time_limit_ms: Option<u64>,
}

/// Word lists per transport mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeHints {
    pub feed: Vec<String>,
    pub discharge: Vec<String>,
    pub transfer: Vec<String>,
}

impl ModeHints {
    /// Creates hint lists from string slices.
    pub fn new(feed: &[&str], discharge: &[&str], transfer: &[&str]) -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            feed: owned(feed),
            discharge: owned(discharge),
            transfer: owned(transfer),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            transport_types: vec!["dosing".into(), "transporting".into(), "conveying".into()],
            mode_parameter: "mode".into(),
            identifier_hints: ModeHints::new(
                &["feed", "inlet", "input"],
                &["discharge", "outlet", "output"],
                &["transfer", "move", "convey", "dosing"],
            ),
            parameter_hints: ModeHints::new(
                &["feedrate", "inletflow", "feed_flow"],
                &["dischargerate", "outlettarget", "discharge_flow"],
                &["transferdistance", "conveyorspeed", "transfer_time"],
            ),
            time_limit_ms: Some(DEFAULT_TIME_LIMIT_MS),
        }
    }
}

impl MatchConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the transport type set.
    pub fn with_transport_types(mut self, types: &[&str]) -> Self {
        self.transport_types = types.iter().map(|t| t.to_lowercase()).collect();
        self
    }

    /// Replaces the identifier hints.
    pub fn with_identifier_hints(mut self, hints: ModeHints) -> Self {
        self.identifier_hints = hints;
        self
    }

    /// Replaces the parameter-name hints.
    pub fn with_parameter_hints(mut self, hints: ModeHints) -> Self {
        self.parameter_hints = hints;
        self
    }

    /// Sets the oracle time limit (ms).
    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = Some(time_limit_ms);
        self
    }

    /// Removes the oracle time limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    /// Whether `semantic_type` is a transport type (case-insensitive).
    pub fn is_transport_type(&self, semantic_type: &str) -> bool {
        self.transport_types
            .iter()
            .any(|t| eq_ignore_case(t, semantic_type))
    }

    /// The time limit as a `Duration`.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = MatchConfig::default();
        assert!(c.is_transport_type("Dosing"));
        assert!(c.is_transport_type("CONVEYING"));
        assert!(!c.is_transport_type("Heating"));
        assert_eq!(c.mode_parameter, "mode");
        assert_eq!(c.time_limit(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builders() {
        let c = MatchConfig::new()
            .with_transport_types(&["Pumping"])
            .with_time_limit_ms(500);
        assert!(c.is_transport_type("pumping"));
        assert!(!c.is_transport_type("dosing"));
        assert_eq!(c.time_limit(), Some(Duration::from_millis(500)));
        assert_eq!(c.without_time_limit().time_limit(), None);
    }

    #[test]
    fn test_transport_types_fold_non_ascii_case() {
        let c = MatchConfig::new().with_transport_types(&["Fördern"]);
        assert!(c.is_transport_type("FÖRDERN"));
        assert!(!c.is_transport_type("Fordern"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: MatchConfig =
            serde_json::from_str(r#"{"transport_types": ["pumping"], "time_limit_ms": null}"#)
                .unwrap();
        assert_eq!(c.transport_types, vec!["pumping"]);
        assert_eq!(c.time_limit_ms, None);
        assert_eq!(c.mode_parameter, "mode");
        assert!(c.identifier_hints.feed.contains(&"inlet".to_string()));
    }
}
