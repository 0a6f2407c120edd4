// adapter.rs — Untyped intent → SpecDsl.
//
// The single boundary between untrusted extraction output and the typed DSL.
// Absent fields get conservative defaults:
//
// 1. No mode and no actions → read_only
// 2. S3 with no resources → placeholder bucket/object ARNs
// 3. No principal/scope → configured placeholders
// 4. S3 read_only with no denials supplied → standard write/delete denial
// 5. A default name already taken by an earlier capability → `{name}_{index}`
//
// Evidence is attached from the category index. The adapter never decides
// whether the result is safe; the validator and guardrail auditor do that.

use iamc_spec::config::AdapterConfig;
use iamc_spec::patterns::s3_no_writes_deletes;
use iamc_spec::{
    ActionSelector, Capability, CapabilityMode, Condition, ConditionOp, ConditionValue,
    EvidenceIndex, MustNever, Principal, Rule, Scope, SpecDsl, Violation,
};

use crate::error::AdaptError;
use crate::raw::{RawCapability, RawCondition, RawMustNever, UntypedIntent};

pub const S3_BUCKET_PLACEHOLDER: &str = "arn:aws:s3:::<BUCKET>";
pub const S3_OBJECT_PLACEHOLDER: &str = "arn:aws:s3:::<BUCKET>/*";

/// Name of the denial synthesized for S3 read-only intents.
pub const SYNTHESIZED_DENY_NAME: &str = "no_s3_writes_deletes";

const DEFAULT_DENY_RATIONALE: &str = "Explicit denial requested by intent";

#[derive(Debug, Clone, Default)]
pub struct IntentAdapter {
    config: AdapterConfig,
}

impl IntentAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Adapt a whole extraction output.
    pub fn adapt_intent(
        &self,
        intent: &UntypedIntent,
        index: &EvidenceIndex,
    ) -> Result<SpecDsl, AdaptError> {
        self.adapt(&intent.capabilities, &intent.must_never, index)
    }

    /// Shape raw capabilities and denials into a SpecDsl.
    ///
    /// Returns every entry that no default can repair (no service, both mode
    /// and actions, unknown mode or operator, incomplete conditions or
    /// denials) in one `AdaptError::Schema`.
    pub fn adapt(
        &self,
        raw_capabilities: &[RawCapability],
        raw_must_never: &[RawMustNever],
        index: &EvidenceIndex,
    ) -> Result<SpecDsl, AdaptError> {
        let mut violations = Vec::new();
        let mut capabilities = Vec::new();

        for (i, raw) in raw_capabilities.iter().enumerate() {
            if let Some(mut cap) = adapt_capability(i, raw, index, &mut violations) {
                let taken = capabilities.iter().any(|c: &Capability| c.name == cap.name);
                if raw.name.is_none() && taken {
                    cap.name = format!("{}_{}", cap.name, i);
                }
                capabilities.push(cap);
            }
        }

        let mut must_never: Vec<MustNever> = raw_must_never
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| adapt_must_never(i, raw, &mut violations))
            .collect();

        if !violations.is_empty() {
            tracing::warn!(
                violations = violations.len(),
                "untyped intent rejected by adapter"
            );
            return Err(AdaptError::Schema(violations));
        }

        if raw_must_never.is_empty() {
            let deny_resources = s3_read_only_resources(&capabilities);
            if !deny_resources.is_empty() {
                tracing::debug!(
                    resources = deny_resources.len(),
                    "synthesizing S3 write/delete denial"
                );
                must_never.push(s3_no_writes_deletes(SYNTHESIZED_DENY_NAME, deny_resources));
            }
        }

        tracing::info!(
            capabilities = capabilities.len(),
            must_never = must_never.len(),
            "adapted untyped intent"
        );

        Ok(SpecDsl::new(
            Principal {
                principal_ref: self.config.principal_ref.clone(),
            },
            Scope {
                accounts: self.config.accounts.clone(),
                regions: self.config.regions.clone(),
            },
            capabilities,
        )
        .with_must_never(must_never))
    }
}

fn adapt_capability(
    i: usize,
    raw: &RawCapability,
    index: &EvidenceIndex,
    violations: &mut Vec<Violation>,
) -> Option<Capability> {
    let service = raw
        .service
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let label = raw
        .name
        .clone()
        .unwrap_or_else(|| format!("capability_{}", i));

    let Some(service) = service else {
        violations.push(Violation::new(
            Some(label.as_str()),
            Rule::MissingField {
                field: "service".to_string(),
            },
        ));
        return None;
    };

    let has_actions = raw.actions.as_ref().is_some_and(|a| !a.is_empty());
    // A blank mode string counts as absent.
    let mode = match raw.mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        None if !has_actions => Some(CapabilityMode::ReadOnly.as_str()),
        other => other,
    };
    let selector = match ActionSelector::from_parts(mode, raw.actions.clone()) {
        Ok(selector) => selector,
        Err(rule) => {
            violations.push(Violation::new(Some(label.as_str()), rule));
            return None;
        }
    };

    let name = raw.name.clone().unwrap_or_else(|| match &selector {
        ActionSelector::Mode(mode) => format!("{}_{}", service, mode),
        ActionSelector::Explicit(_) => format!("{}_custom", service),
    });

    let mut resources = raw.resources.clone().unwrap_or_default();
    if service == "s3" && resources.is_empty() {
        resources = vec![
            S3_BUCKET_PLACEHOLDER.to_string(),
            S3_OBJECT_PLACEHOLDER.to_string(),
        ];
    }

    let mut conditions = Vec::new();
    for (j, raw_cond) in raw.conditions.iter().flatten().enumerate() {
        match adapt_condition(raw_cond, index) {
            Ok(cond) => conditions.push(cond),
            Err(rule) => {
                let rule = match rule {
                    Rule::MissingField { field } => Rule::MissingField {
                        field: format!("conditions[{}].{}", j, field),
                    },
                    other => other,
                };
                violations.push(Violation::new(Some(name.as_str()), rule));
            }
        }
    }

    tracing::debug!(capability = %name, service = %service, %selector, "adapted capability");

    let mut cap = Capability::new(name, service.clone(), selector, resources)
        .with_conditions(conditions)
        .with_evidence(index.for_service(&service));
    if let Some(components) = &raw.components {
        cap = cap.with_components(components.clone());
    }
    Some(cap)
}

fn adapt_condition(raw: &RawCondition, index: &EvidenceIndex) -> Result<Condition, Rule> {
    let missing = |field: &str| Rule::MissingField {
        field: field.to_string(),
    };
    let key = raw.key.as_deref().ok_or_else(|| missing("key"))?;
    let op: ConditionOp = raw.op.as_deref().ok_or_else(|| missing("op"))?.parse()?;
    let value = raw
        .value
        .as_ref()
        .and_then(condition_value)
        .ok_or_else(|| missing("value"))?;
    Ok(Condition::new(key, op, value).with_evidence(index.for_condition_key(key)))
}

/// Strings pass through; booleans and numbers are stringified; lists of
/// those become string lists. Nulls, objects and nested lists are refused.
fn condition_value(value: &serde_json::Value) -> Option<ConditionValue> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Option<Vec<_>>>()
            .map(ConditionValue::List),
        other => scalar_string(other).map(ConditionValue::Scalar),
    }
}

fn scalar_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn adapt_must_never(
    i: usize,
    raw: &RawMustNever,
    violations: &mut Vec<Violation>,
) -> Option<MustNever> {
    let name = raw.name.clone().unwrap_or_else(|| format!("deny_{}", i));
    let actions = raw.actions.clone().unwrap_or_default();
    let resources = raw.resources.clone().unwrap_or_default();

    let mut complete = true;
    for (field, empty) in [("actions", actions.is_empty()), ("resources", resources.is_empty())] {
        if empty {
            complete = false;
            violations.push(Violation::new(
                Some(name.as_str()),
                Rule::MissingField {
                    field: field.to_string(),
                },
            ));
        }
    }
    if !complete {
        return None;
    }

    Some(MustNever {
        rationale: raw
            .rationale
            .clone()
            .unwrap_or_else(|| DEFAULT_DENY_RATIONALE.to_string()),
        name,
        actions,
        resources,
        evidence: Vec::new(),
    })
}

/// Resources of every S3 read_only capability, first occurrence order.
fn s3_read_only_resources(capabilities: &[Capability]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in capabilities.iter().filter(|c| c.is_s3_read_only()) {
        for r in &cap.resources {
            if !out.contains(r) {
                out.push(r.clone());
            }
        }
    }
    out
}
