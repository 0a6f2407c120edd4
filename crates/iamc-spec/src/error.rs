// error.rs — Error types for spec validation, canonization and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::violation::Violation;

/// Errors that abort canonization. Both signal an upstream contract bug:
/// a validated spec never produces either.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonizeError {
    /// No action list could be determined for a capability.
    #[error("cannot determine actions for capability '{capability}' (service '{service}', {selector})")]
    Resolution {
        capability: String,
        service: String,
        selector: String,
    },

    /// Two conditions in one capability share an operator and key.
    #[error("capability '{capability}' declares condition {operator}/{key} more than once")]
    ConflictingCondition {
        capability: String,
        operator: String,
        key: String,
    },
}

/// Errors from the fail-closed `validate_and_canonize` entry point.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The spec has at least one invariant violation; no baseline was produced.
    #[error("spec DSL validation failed: {}", render_violations(.0))]
    Validation(Vec<Violation>),

    #[error(transparent)]
    Canonize(#[from] CanonizeError),
}

impl PolicyError {
    /// The violations that blocked canonization (empty for canonizer failures).
    pub fn violations(&self) -> &[Violation] {
        match self {
            PolicyError::Validation(violations) => violations,
            PolicyError::Canonize(_) => &[],
        }
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An evidence confidence outside 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("confidence {0} is outside 0..=100")]
pub struct ConfidenceOutOfRange(pub u32);

/// Errors from loading configuration or registry files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse service registry YAML: {0}")]
    Registry(#[from] serde_yaml::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::Rule;

    #[test]
    fn validation_error_joins_messages() {
        let err = PolicyError::Validation(vec![
            Violation::new(Some("a"), Rule::WildcardResources),
            Violation::new(
                None,
                Rule::UnsupportedVersion {
                    found: "9".to_string(),
                },
            ),
        ]);
        let display = err.to_string();
        assert!(display.starts_with("spec DSL validation failed: "));
        assert!(display.contains("wildcard"));
        assert!(display.contains("; Unsupported DSL version: 9"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn canonize_error_display() {
        let err = CanonizeError::ConflictingCondition {
            capability: "read".to_string(),
            operator: "Bool".to_string(),
            key: "aws:SecureTransport".to_string(),
        };
        assert!(err.to_string().contains("Bool/aws:SecureTransport"));
        assert!(PolicyError::from(err).violations().is_empty());
    }
}
