// violation.rs — Structured invariant violations reported by the validator.
//
// Violations are data, not strings: callers branch on `kind` and `rule`,
// and the human-readable message is only rendered at the boundary via
// `Display`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad category of a violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The document is malformed (selector shape, unknown mode, missing fields).
    Schema,
    /// The document is well-formed but breaks a security invariant.
    SecurityInvariant,
    /// The DSL version is not supported.
    Version,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Schema => write!(f, "schema"),
            ViolationKind::SecurityInvariant => write!(f, "security_invariant"),
            ViolationKind::Version => write!(f, "version"),
        }
    }
}

/// The specific invariant that was broken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    UnsupportedVersion { found: String },
    UnknownService { service: String },
    /// A capability carried both a coarse mode and an explicit action list.
    ModeAndActions,
    /// A capability carried neither a mode nor a non-empty action list.
    MissingActionSelector,
    UnknownMode { mode: String },
    /// The service has no action table for the requested mode.
    UnresolvableMode { service: String, mode: String },
    UnknownOperator { operator: String },
    /// A required field was absent from raw input.
    MissingField { field: String },
    NoResources,
    WildcardResources,
    ConditionKeyNotAllowed { key: String, service: String },
    DuplicateCondition { operator: String, key: String },
    /// Two entries compile to the same statement id.
    DuplicateStatementId { sid: String },
    LowConfidence { floor: u8 },
    MissingBucketArn,
    MissingObjectArn,
}

impl Rule {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Rule::UnsupportedVersion { .. } => ViolationKind::Version,
            Rule::UnknownService { .. }
            | Rule::ModeAndActions
            | Rule::MissingActionSelector
            | Rule::UnknownMode { .. }
            | Rule::UnresolvableMode { .. }
            | Rule::UnknownOperator { .. }
            | Rule::MissingField { .. }
            | Rule::DuplicateCondition { .. }
            | Rule::DuplicateStatementId { .. } => ViolationKind::Schema,
            Rule::NoResources
            | Rule::WildcardResources
            | Rule::ConditionKeyNotAllowed { .. }
            | Rule::LowConfidence { .. }
            | Rule::MissingBucketArn
            | Rule::MissingObjectArn => ViolationKind::SecurityInvariant,
        }
    }

    /// Whether the rule describes required input that the caller has not
    /// supplied yet, as opposed to input that is present but unsafe.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            Rule::MissingActionSelector
                | Rule::MissingField { .. }
                | Rule::NoResources
                | Rule::MissingBucketArn
                | Rule::MissingObjectArn
        )
    }
}

/// One invariant violation, optionally attributed to a capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(flatten)]
    pub rule: Rule,
}

impl Violation {
    pub fn new(capability: Option<&str>, rule: Rule) -> Self {
        Self {
            kind: rule.kind(),
            capability: capability.map(str::to_string),
            rule,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cap = self.capability.as_deref().unwrap_or("<unnamed>");
        match &self.rule {
            Rule::UnsupportedVersion { found } => write!(f, "Unsupported DSL version: {}", found),
            Rule::UnknownService { service } => {
                write!(f, "Unknown service in capability '{}': {}", cap, service)
            }
            Rule::ModeAndActions => write!(
                f,
                "Capability '{}' cannot have both mode and explicit actions",
                cap
            ),
            Rule::MissingActionSelector => write!(
                f,
                "Capability '{}' must have either mode or explicit actions",
                cap
            ),
            Rule::UnknownMode { mode } => {
                write!(f, "Invalid mode in capability '{}': {}", cap, mode)
            }
            Rule::UnresolvableMode { service, mode } => write!(
                f,
                "Service '{}' defines no {} actions for capability '{}'",
                service, mode, cap
            ),
            Rule::UnknownOperator { operator } => write!(
                f,
                "Condition operator '{}' in capability '{}' is not whitelisted",
                operator, cap
            ),
            Rule::MissingField { field } => {
                write!(f, "Entry '{}' is missing required field '{}'", cap, field)
            }
            Rule::NoResources => write!(
                f,
                "Capability '{}' is missing resources - explicit ARNs required",
                cap
            ),
            Rule::WildcardResources => write!(
                f,
                "Capability '{}' uses wildcard resources - explicit ARNs required",
                cap
            ),
            Rule::ConditionKeyNotAllowed { key, service } => write!(
                f,
                "Condition key '{}' not allowed for service '{}'",
                key, service
            ),
            Rule::DuplicateCondition { operator, key } => write!(
                f,
                "Capability '{}' declares condition {}/{} more than once",
                cap, operator, key
            ),
            Rule::DuplicateStatementId { sid } => write!(
                f,
                "Entry '{}' compiles to statement id '{}', already used by an earlier entry",
                cap, sid
            ),
            Rule::LowConfidence { floor } => write!(
                f,
                "Capability '{}' has evidence with confidence < {}%",
                cap, floor
            ),
            Rule::MissingBucketArn => write!(
                f,
                "S3 read_only capability '{}' missing bucket-level ARN",
                cap
            ),
            Rule::MissingObjectArn => write!(
                f,
                "S3 read_only capability '{}' missing object-level ARN",
                cap
            ),
        }
    }
}
