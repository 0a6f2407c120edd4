// dsl.rs — The spec DSL: typed intent with provenance.
//
// A SpecDsl says who gets access, in which accounts and regions, through
// which capabilities, and what must never be allowed. It is the single
// source of truth for baseline generation.
//
// Capabilities choose their actions through `ActionSelector`, so "both mode
// and actions" and "neither" cannot be represented once a value exists.
// The JSON wire shape keeps separate `mode` and `actions` fields; decoding
// goes through `CapabilityWire`, which rejects the invalid combinations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::violation::{Rule, Violation};

/// The only DSL version this crate understands.
pub const DSL_VERSION: &str = "0.1";

/// Default principal placeholder, bound at deploy time.
pub const PRINCIPAL_PLACEHOLDER: &str = "PRINCIPAL_ARN";

/// Coarse access level that the canonizer expands to a known action set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityMode {
    ReadOnly,
    Write,
    Admin,
}

impl CapabilityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityMode::ReadOnly => "read_only",
            CapabilityMode::Write => "write",
            CapabilityMode::Admin => "admin",
        }
    }
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityMode {
    type Err = Rule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_only" => Ok(CapabilityMode::ReadOnly),
            "write" => Ok(CapabilityMode::Write),
            "admin" => Ok(CapabilityMode::Admin),
            other => Err(Rule::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// How a capability's actions are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSelector {
    Mode(CapabilityMode),
    /// Explicit actions, used verbatim.
    Explicit(Vec<String>),
}

impl ActionSelector {
    /// Build a selector from the two optional wire fields.
    ///
    /// An empty action list counts as absent.
    pub fn from_parts(mode: Option<&str>, actions: Option<Vec<String>>) -> Result<Self, Rule> {
        let actions = actions.filter(|a| !a.is_empty());
        match (mode, actions) {
            (Some(_), Some(_)) => Err(Rule::ModeAndActions),
            (None, None) => Err(Rule::MissingActionSelector),
            (Some(mode), None) => mode.parse().map(ActionSelector::Mode),
            (None, Some(actions)) => Ok(ActionSelector::Explicit(actions)),
        }
    }

    pub fn mode(&self) -> Option<CapabilityMode> {
        match self {
            ActionSelector::Mode(mode) => Some(*mode),
            ActionSelector::Explicit(_) => None,
        }
    }

    pub fn explicit_actions(&self) -> Option<&[String]> {
        match self {
            ActionSelector::Mode(_) => None,
            ActionSelector::Explicit(actions) => Some(actions),
        }
    }
}

impl fmt::Display for ActionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSelector::Mode(mode) => write!(f, "mode {}", mode),
            ActionSelector::Explicit(actions) => write!(f, "{} explicit actions", actions.len()),
        }
    }
}

/// Whitelisted condition operators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionOp {
    StringEquals,
    StringLike,
    IpAddress,
    DateEquals,
    DateGreaterThan,
    DateLessThan,
    Bool,
    NumericEquals,
    NumericLessThan,
    NumericGreaterThan,
}

impl ConditionOp {
    pub const ALL: [ConditionOp; 10] = [
        ConditionOp::StringEquals,
        ConditionOp::StringLike,
        ConditionOp::IpAddress,
        ConditionOp::DateEquals,
        ConditionOp::DateGreaterThan,
        ConditionOp::DateLessThan,
        ConditionOp::Bool,
        ConditionOp::NumericEquals,
        ConditionOp::NumericLessThan,
        ConditionOp::NumericGreaterThan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOp::StringEquals => "StringEquals",
            ConditionOp::StringLike => "StringLike",
            ConditionOp::IpAddress => "IpAddress",
            ConditionOp::DateEquals => "DateEquals",
            ConditionOp::DateGreaterThan => "DateGreaterThan",
            ConditionOp::DateLessThan => "DateLessThan",
            ConditionOp::Bool => "Bool",
            ConditionOp::NumericEquals => "NumericEquals",
            ConditionOp::NumericLessThan => "NumericLessThan",
            ConditionOp::NumericGreaterThan => "NumericGreaterThan",
        }
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionOp {
    type Err = Rule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Rule::UnknownOperator {
                operator: s.to_string(),
            })
    }
}

/// A condition value: one string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConditionValue {
    Scalar(String),
    List(Vec<String>),
}

impl ConditionValue {
    /// Whether the value is exactly the scalar `s`.
    pub fn is_scalar(&self, s: &str) -> bool {
        matches!(self, ConditionValue::Scalar(v) if v == s)
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        ConditionValue::Scalar(s.to_string())
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(v: Vec<String>) -> Self {
        ConditionValue::List(v)
    }
}

/// One safety constraint, e.g. require encrypted transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Condition {
    /// e.g. "aws:SourceIp", "ec2:ResourceTag/Project".
    pub key: String,
    #[serde(rename = "op")]
    pub operator: ConditionOp,
    pub value: ConditionValue,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: ConditionOp, value: ConditionValue) -> Self {
        Self {
            key: key.into(),
            operator,
            value,
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// One logical permission grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "CapabilityWire", into = "CapabilityWire")]
pub struct Capability {
    /// Human label, e.g. "s3_read_bucket".
    pub name: String,
    /// "s3", "kms", "ec2", ...
    pub service: String,
    /// Explicit ARNs. "*" is discouraged and rejected when used alone.
    pub resources: Vec<String>,
    /// Why this capability exists.
    pub evidence: Vec<Evidence>,
    pub selector: ActionSelector,
    /// Service-specific coarse targets, e.g. ["objects", "bucket"].
    pub components: Option<Vec<String>>,
    pub conditions: Vec<Condition>,
}

impl Capability {
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        selector: ActionSelector,
        resources: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            resources,
            evidence: Vec::new(),
            selector,
            components: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn mode(&self) -> Option<CapabilityMode> {
        self.selector.mode()
    }

    /// S3 capability in read_only mode.
    pub fn is_s3_read_only(&self) -> bool {
        self.service == "s3" && self.mode() == Some(CapabilityMode::ReadOnly)
    }
}

/// JSON shape of a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CapabilityWire {
    name: String,
    service: String,
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    evidence: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
}

impl TryFrom<CapabilityWire> for Capability {
    type Error = Violation;

    fn try_from(wire: CapabilityWire) -> Result<Self, Self::Error> {
        let selector = ActionSelector::from_parts(wire.mode.as_deref(), wire.actions)
            .map_err(|rule| Violation::new(Some(&wire.name), rule))?;
        Ok(Self {
            name: wire.name,
            service: wire.service,
            resources: wire.resources,
            evidence: wire.evidence,
            selector,
            components: wire.components,
            conditions: wire.conditions,
        })
    }
}

impl From<Capability> for CapabilityWire {
    fn from(cap: Capability) -> Self {
        let (mode, actions) = match cap.selector {
            ActionSelector::Mode(mode) => (Some(mode.as_str().to_string()), None),
            ActionSelector::Explicit(actions) => (None, Some(actions)),
        };
        Self {
            name: cap.name,
            service: cap.service,
            resources: cap.resources,
            evidence: cap.evidence,
            mode,
            actions,
            components: cap.components,
            conditions: cap.conditions,
        }
    }
}

/// An explicit denial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MustNever {
    pub name: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

/// The "who" block. Bound to a real principal at deploy time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    #[serde(default)]
    pub principal_ref: String,
}

impl Default for Principal {
    fn default() -> Self {
        Self {
            principal_ref: PRINCIPAL_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scope {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Root intent document. Constructed once per request; re-validation after
/// any change means building a new value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecDsl {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub who: Principal,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_never: Vec<MustNever>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

fn default_version() -> String {
    DSL_VERSION.to_string()
}

impl SpecDsl {
    pub fn new(who: Principal, scope: Scope, capabilities: Vec<Capability>) -> Self {
        Self {
            version: default_version(),
            who,
            scope,
            capabilities,
            must_never: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_must_never(mut self, must_never: Vec<MustNever>) -> Self {
        self.must_never = must_never;
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
