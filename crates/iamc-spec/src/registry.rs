// registry.rs — Per-service lookup tables.
//
// The registry maps each known service to its condition-key whitelist and
// its mode → action table. It is built once and only read afterwards, so a
// single `&ServiceRegistry` can be shared by any number of concurrent
// compilation sessions. `global()` returns the process-wide built-in copy;
// callers with custom services build their own and pass it by reference.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::dsl::CapabilityMode;
use crate::error::ConfigError;

/// Lookup tables for one service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Condition keys allowed for this service. An entry ending in `/*`
    /// admits any key with that prefix.
    #[serde(default)]
    pub allowed_condition_keys: Vec<String>,
    #[serde(default)]
    pub mode_actions: BTreeMap<CapabilityMode, Vec<String>>,
}

impl ServiceDefinition {
    pub fn allows_condition_key(&self, key: &str) -> bool {
        self.allowed_condition_keys
            .iter()
            .any(|allowed| condition_key_matches(allowed, key))
    }

    pub fn actions_for(&self, mode: CapabilityMode) -> Option<&[String]> {
        self.mode_actions.get(&mode).map(Vec::as_slice)
    }
}

/// Exact match, or prefix match for whitelist entries ending in `/*`.
pub fn condition_key_matches(allowed: &str, key: &str) -> bool {
    if allowed == key {
        return true;
    }
    match allowed.strip_suffix('*') {
        Some(prefix) if allowed.ends_with("/*") => key.starts_with(prefix),
        _ => false,
    }
}

/// YAML file layout: `services: { <name>: ServiceDefinition }`.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    services: BTreeMap<String, ServiceDefinition>,
}

/// Immutable service → tables registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceDefinition>,
}

static GLOBAL: OnceLock<ServiceRegistry> = OnceLock::new();

impl ServiceRegistry {
    /// The built-in s3, kms and ec2 tables.
    pub fn builtin() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            "s3".to_string(),
            definition(
                &[
                    "aws:SourceIp",
                    "aws:SourceVpc",
                    "aws:SourceVpce",
                    "aws:SecureTransport",
                    "aws:userid",
                    "aws:username",
                    "aws:PrincipalTag/*",
                    "aws:RequestTag/*",
                    "s3:prefix",
                    "s3:delimiter",
                    "s3:max-keys",
                    "s3:ExistingObjectTag/*",
                    "s3:x-amz-server-side-encryption",
                    "s3:x-amz-server-side-encryption-aws-kms-key-id",
                ],
                &["s3:ListBucket", "s3:GetObject", "s3:GetBucketLocation"],
                &[
                    "s3:ListBucket",
                    "s3:GetObject",
                    "s3:PutObject",
                    "s3:DeleteObject",
                ],
                &["s3:*"],
            ),
        );
        services.insert(
            "kms".to_string(),
            definition(
                &[
                    "aws:SourceIp",
                    "aws:SourceVpc",
                    "aws:SecureTransport",
                    "aws:userid",
                    "kms:ViaService",
                    "kms:EncryptionContext:*",
                    "kms:CallerAccount",
                ],
                &["kms:Decrypt"],
                &["kms:Decrypt", "kms:Encrypt", "kms:GenerateDataKey"],
                &["kms:*"],
            ),
        );
        services.insert(
            "ec2".to_string(),
            definition(
                &[
                    "aws:SourceIp",
                    "aws:SourceVpc",
                    "aws:SecureTransport",
                    "aws:userid",
                    "ec2:Region",
                    "ec2:ResourceTag/*",
                    "ec2:Tenancy",
                    "ec2:InstanceType",
                ],
                &["ec2:Describe*", "ec2:List*"],
                &[
                    "ec2:Describe*",
                    "ec2:List*",
                    "ec2:RunInstances",
                    "ec2:TerminateInstances",
                ],
                &["ec2:*"],
            ),
        );
        Self { services }
    }

    /// Process-wide built-in registry, initialized on first use.
    pub fn global() -> &'static ServiceRegistry {
        GLOBAL.get_or_init(Self::builtin)
    }

    /// Parse service definitions from YAML.
    ///
    /// ```yaml
    /// services:
    ///   dynamodb:
    ///     allowed_condition_keys: ["aws:SourceIp", "dynamodb:LeadingKeys"]
    ///     mode_actions:
    ///       read_only: ["dynamodb:GetItem", "dynamodb:Query"]
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        Ok(Self {
            services: file.services,
        })
    }

    /// Combine two registries; definitions in `other` replace same-named ones.
    pub fn merge(mut self, other: ServiceRegistry) -> Self {
        self.services.extend(other.services);
        self
    }

    pub fn get(&self, service: &str) -> Option<&ServiceDefinition> {
        self.services.get(service)
    }

    pub fn contains(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn actions_for(&self, service: &str, mode: CapabilityMode) -> Option<&[String]> {
        self.get(service)?.actions_for(mode)
    }
}

fn definition(
    keys: &[&str],
    read_only: &[&str],
    write: &[&str],
    admin: &[&str],
) -> ServiceDefinition {
    let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let mut mode_actions = BTreeMap::new();
    mode_actions.insert(CapabilityMode::ReadOnly, owned(read_only));
    mode_actions.insert(CapabilityMode::Write, owned(write));
    mode_actions.insert(CapabilityMode::Admin, owned(admin));
    ServiceDefinition {
        allowed_condition_keys: owned(keys),
        mode_actions,
    }
}
