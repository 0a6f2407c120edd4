// document.rs — Policy document wire types.
//
// The JSON shape here is the contract with downstream enforcement:
// `{"Version": "2012-10-17", "Statement": [{"Sid", "Effect", "Action",
// "Resource", "Condition"?}]}`. Field names and nesting must not change.
//
// `BaselinePolicy` wraps a document and can only be built inside this crate
// (by the canonizer). It serializes but does not deserialize, so a baseline
// cannot be forged from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::hasher;

/// The policy grammar version every document carries.
pub const POLICY_VERSION: &str = "2012-10-17";

/// `{operator: {key: value}}`
pub type ConditionBlock = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    #[serde(rename = "Sid", default)]
    pub sid: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action", default, deserialize_with = "one_or_many")]
    pub action: Vec<String>,
    #[serde(rename = "Resource", default, deserialize_with = "one_or_many")]
    pub resource: Vec<String>,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionBlock>,
}

/// Candidate policies may write a single action or resource as a bare string.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement", default)]
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statement
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// SHA-256 of the compact JSON encoding.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        Ok(hasher::hash_bytes(&serde_json::to_vec(self)?))
    }
}

/// A policy produced by the canonizer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BaselinePolicy(PolicyDocument);

impl BaselinePolicy {
    pub(crate) fn new(document: PolicyDocument) -> Self {
        Self(document)
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.0
    }

    pub fn into_document(self) -> PolicyDocument {
        self.0
    }
}

impl AsRef<PolicyDocument> for BaselinePolicy {
    fn as_ref(&self) -> &PolicyDocument {
        &self.0
    }
}

/// A policy produced outside the core. Not assumed invariant-compliant.
pub type CandidatePolicy = PolicyDocument;
