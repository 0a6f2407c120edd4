// raw.rs — Untrusted intent as it arrives from the extraction step.
//
// Every field is optional and nothing here is validated. The adapter is the
// only code that turns these values into `iamc_spec` types.

use serde::{Deserialize, Serialize};

use crate::error::AdaptError;

/// Top-level extraction output:
/// `{capabilities, must_never, assumptions, confidence}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UntypedIntent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<RawCapability>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub must_never: Vec<RawMustNever>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assumptions: Vec<String>,
    /// Extraction confidence in 0.0..=1.0.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl UntypedIntent {
    pub fn from_json(json: &str) -> Result<Self, AdaptError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCapability {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
    #[serde(default)]
    pub components: Option<Vec<String>>,
    #[serde(default)]
    pub conditions: Option<Vec<RawCondition>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCondition {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, alias = "operator")]
    pub op: Option<String>,
    /// String, bool, number or list of those.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMustNever {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
    #[serde(default)]
    pub rationale: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_fields_default() {
        let intent = UntypedIntent::from_json(
            r#"{"capabilities": [{"service": "s3"}], "must_never": null}"#,
        )
        .unwrap();
        assert_eq!(intent.capabilities.len(), 1);
        assert_eq!(intent.capabilities[0].service.as_deref(), Some("s3"));
        assert!(intent.capabilities[0].mode.is_none());
        assert!(intent.must_never.is_empty());
        assert!(intent.confidence.is_none());
    }

    #[test]
    fn condition_operator_alias() {
        let cond: RawCondition =
            serde_json::from_str(r#"{"key": "aws:SecureTransport", "operator": "Bool", "value": true}"#)
                .unwrap();
        assert_eq!(cond.op.as_deref(), Some("Bool"));
        assert_eq!(cond.value, Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            UntypedIntent::from_json("{\"capabilities\": 3}"),
            Err(AdaptError::Json(_))
        ));
    }
}
