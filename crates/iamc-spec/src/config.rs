//! Compiler configuration, loaded from TOML.
//!
//! ```toml
//! registry = "services.yaml"
//!
//! [validator]
//! min_confidence = 80
//!
//! [guardrails]
//! verbose = true
//!
//! [adapter]
//! principal_ref = "PRINCIPAL_ARN"
//! accounts = ["ACCOUNT_ID"]
//! regions = ["us-east-1"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsl::PRINCIPAL_PLACEHOLDER;
use crate::error::ConfigError;
use crate::evidence::Confidence;
use crate::registry::ServiceRegistry;
use crate::validator::{DslValidator, DEFAULT_MIN_CONFIDENCE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub guardrails: GuardrailConfig,

    #[serde(default)]
    pub adapter: AdapterConfig,

    /// Extra service definitions (YAML), merged over the built-in registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Evidence confidence floor, 0..=100.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardrailConfig {
    /// Report internal validation failures as a risk callout.
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self { verbose: true }
    }
}

/// Placeholders the intent adapter fills in when the intent is silent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdapterConfig {
    #[serde(default = "default_principal_ref")]
    pub principal_ref: String,

    #[serde(default = "default_accounts")]
    pub accounts: Vec<String>,

    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            principal_ref: default_principal_ref(),
            accounts: default_accounts(),
            regions: default_regions(),
        }
    }
}

fn default_min_confidence() -> u8 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_true() -> bool {
    true
}

fn default_principal_ref() -> String {
    PRINCIPAL_PLACEHOLDER.to_string()
}

fn default_accounts() -> Vec<String> {
    vec!["ACCOUNT_ID".to_string()]
}

fn default_regions() -> Vec<String> {
    vec!["us-east-1".to_string()]
}

impl CoreConfig {
    /// Parse and check a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Relative `registry` paths resolve against the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let (Some(registry), Some(dir)) = (&config.registry, path.parent()) {
            if registry.is_relative() {
                config.registry = Some(dir.join(registry));
            }
        }
        tracing::debug!(path = %path.display(), "loaded compiler config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator.min_confidence > Confidence::MAX {
            return Err(ConfigError::Invalid {
                field: "validator.min_confidence".to_string(),
                reason: format!(
                    "{} exceeds {}",
                    self.validator.min_confidence,
                    Confidence::MAX
                ),
            });
        }
        if self.adapter.principal_ref.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "adapter.principal_ref".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The built-in registry, extended by the configured YAML file if any.
    pub fn service_registry(&self) -> Result<ServiceRegistry, ConfigError> {
        let builtin = ServiceRegistry::builtin();
        let Some(path) = &self.registry else {
            return Ok(builtin);
        };
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let extra = ServiceRegistry::from_yaml(&yaml)?;
        tracing::info!(
            path = %path.display(),
            services = extra.services().count(),
            "merged service registry"
        );
        Ok(builtin.merge(extra))
    }

    pub fn validator<'r>(&self, registry: &'r ServiceRegistry) -> DslValidator<'r> {
        DslValidator::new(registry).with_min_confidence(self.validator.min_confidence)
    }
}
