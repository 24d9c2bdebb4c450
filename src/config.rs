//! Council configuration
//!
//! Loaded from YAML or built in code. Every field has a default, so an empty
//! document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CouncilError;

fn default_name() -> String {
    "council".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouncilConfig {
    /// Label attached to the tracing span of every call
    #[serde(default = "default_name")]
    pub name: String,

    /// Upper bound on member invocations per call. `None` means unbounded.
    ///
    /// Enqueue lets members add work to a running call, so a pair of members
    /// enqueueing each other never finishes. The limit turns that into an
    /// error instead.
    #[serde(default)]
    pub max_invocations: Option<usize>,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_invocations: None,
        }
    }
}

impl CouncilConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_invocations(mut self, limit: usize) -> Self {
        self.max_invocations = Some(limit);
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CouncilError> {
        // an empty document parses as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CouncilError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(CouncilConfig::from_yaml("").unwrap(), CouncilConfig::default());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = CouncilConfig::from_yaml("max_invocations: 10\n").unwrap();
        assert_eq!(config.name, "council");
        assert_eq!(config.max_invocations, Some(10));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = CouncilConfig::from_yaml("nmae: typo\n").unwrap_err();
        assert!(matches!(err, CouncilError::Config(_)));
    }

    #[test]
    fn builder_helpers() {
        let config = CouncilConfig::named("fizzbuzz").with_max_invocations(3);
        assert_eq!(config.name, "fizzbuzz");
        assert_eq!(config.max_invocations, Some(3));
    }
}
