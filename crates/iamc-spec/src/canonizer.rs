// canonizer.rs — Deterministic SpecDsl → baseline policy compiler.
//
// The canonizer trusts its input: it is only defined for specs that pass
// the validator. `validate_and_canonize` is the fail-closed entry point that
// guarantees every emitted baseline has zero violations.
//
// Per capability:
// 1. Resolve actions (explicit list verbatim, else the registry's mode table)
// 2. For s3, split into BucketLevel / ObjectLevel / General statements;
//    otherwise emit one statement
// 3. Attach the capability's condition block to every statement
//
// Then one Deny per must-never entry, after all Allows. Output depends only
// on the input spec: no clocks, no randomness, ordered maps throughout.

use std::collections::BTreeMap;

use crate::document::{BaselinePolicy, ConditionBlock, Effect, PolicyDocument, Statement};
use crate::dsl::{ActionSelector, Capability, Condition, ConditionValue, MustNever, SpecDsl};
use crate::error::{CanonizeError, PolicyError};
use crate::registry::ServiceRegistry;
use crate::validator::{is_object_arn, DslValidator};

/// S3 actions that operate on the bucket ARN.
pub const S3_BUCKET_ACTIONS: &[&str] = &[
    "s3:ListBucket",
    "s3:GetBucketLocation",
    "s3:GetBucketVersioning",
    "s3:GetBucketAcl",
    "s3:GetBucketPolicy",
    "s3:GetBucketTagging",
    "s3:ListBucketVersions",
    "s3:ListBucketMultipartUploads",
];

/// S3 actions that operate on object ARNs.
pub const S3_OBJECT_ACTIONS: &[&str] = &[
    "s3:GetObject",
    "s3:PutObject",
    "s3:DeleteObject",
    "s3:GetObjectVersion",
    "s3:DeleteObjectVersion",
    "s3:GetObjectAcl",
    "s3:PutObjectAcl",
    "s3:GetObjectTagging",
    "s3:PutObjectTagging",
    "s3:DeleteObjectTagging",
];

/// Sid suffixes of the three S3 statement kinds, in emission order.
const S3_SPLIT_SUFFIXES: [&str; 3] = ["BucketLevel", "ObjectLevel", "General"];

/// Compiles spec documents into baseline policies.
#[derive(Debug, Clone, Copy)]
pub struct Canonizer<'r> {
    registry: &'r ServiceRegistry,
}

impl<'r> Canonizer<'r> {
    pub fn new(registry: &'r ServiceRegistry) -> Self {
        Self { registry }
    }

    /// Compile a validated spec into a baseline policy.
    pub fn canonize(&self, spec: &SpecDsl) -> Result<BaselinePolicy, CanonizeError> {
        let mut statements = Vec::new();

        for cap in &spec.capabilities {
            let actions = self.resolve_actions(cap)?;
            let condition = build_condition_block(&cap.name, &cap.conditions)?;
            tracing::debug!(
                capability = %cap.name,
                service = %cap.service,
                actions = actions.len(),
                "canonizing capability"
            );
            if cap.service == "s3" {
                statements.extend(s3_statements(cap, &actions, condition));
            } else {
                statements.push(Statement {
                    sid: format!("Allow{}", pascal_case(&cap.name)),
                    effect: Effect::Allow,
                    action: actions,
                    resource: cap.resources.clone(),
                    condition,
                });
            }
        }

        statements.extend(spec.must_never.iter().map(deny_statement));

        tracing::info!(statements = statements.len(), "baseline policy built");
        Ok(BaselinePolicy::new(PolicyDocument::new(statements)))
    }

    fn resolve_actions(&self, cap: &Capability) -> Result<Vec<String>, CanonizeError> {
        let resolved = match &cap.selector {
            ActionSelector::Explicit(actions) if !actions.is_empty() => Some(actions.clone()),
            ActionSelector::Explicit(_) => None,
            ActionSelector::Mode(mode) => self
                .registry
                .actions_for(&cap.service, *mode)
                .map(<[String]>::to_vec),
        };
        resolved.ok_or_else(|| CanonizeError::Resolution {
            capability: cap.name.clone(),
            service: cap.service.clone(),
            selector: cap.selector.to_string(),
        })
    }
}

/// Canonize against the built-in registry.
pub fn canonize(spec: &SpecDsl) -> Result<BaselinePolicy, CanonizeError> {
    Canonizer::new(ServiceRegistry::global()).canonize(spec)
}

/// Validate, then canonize only if there are no violations.
pub fn validate_and_canonize(spec: &SpecDsl) -> Result<BaselinePolicy, PolicyError> {
    validate_and_canonize_with(&DslValidator::new(ServiceRegistry::global()), spec)
}

/// Fail-closed compilation with an explicit validator (and its registry).
pub fn validate_and_canonize_with(
    validator: &DslValidator<'_>,
    spec: &SpecDsl,
) -> Result<BaselinePolicy, PolicyError> {
    let violations = validator.validate(spec);
    if !violations.is_empty() {
        tracing::warn!(
            violations = violations.len(),
            "spec failed validation; no baseline produced"
        );
        return Err(PolicyError::Validation(violations));
    }
    Ok(Canonizer::new(validator.registry()).canonize(spec)?)
}

fn s3_statements(
    cap: &Capability,
    actions: &[String],
    condition: Option<ConditionBlock>,
) -> Vec<Statement> {
    let base = pascal_case(&cap.name);
    let (object_resources, bucket_resources): (Vec<String>, Vec<String>) = cap
        .resources
        .iter()
        .cloned()
        .partition(|r| is_object_arn(r));

    let bucket_actions: Vec<String> = actions
        .iter()
        .filter(|a| in_list(S3_BUCKET_ACTIONS, a.as_str()))
        .cloned()
        .collect();
    let object_actions: Vec<String> = actions
        .iter()
        .filter(|a| in_list(S3_OBJECT_ACTIONS, a.as_str()))
        .cloned()
        .collect();
    let general_actions: Vec<String> = actions
        .iter()
        .filter(|a| {
            !in_list(S3_BUCKET_ACTIONS, a.as_str()) && !in_list(S3_OBJECT_ACTIONS, a.as_str())
        })
        .cloned()
        .collect();

    let [bucket, object, general] = S3_SPLIT_SUFFIXES;
    [
        (bucket, bucket_actions, bucket_resources),
        (object, object_actions, object_resources),
        (general, general_actions, cap.resources.clone()),
    ]
    .into_iter()
    .filter(|(_, acts, res)| !acts.is_empty() && !res.is_empty())
    .map(|(suffix, action, resource)| Statement {
        sid: format!("Allow{}{}", base, suffix),
        effect: Effect::Allow,
        action,
        resource,
        condition: condition.clone(),
    })
    .collect()
}

fn in_list(list: &[&str], action: &str) -> bool {
    list.contains(&action)
}

/// Group conditions by operator, then key. A repeated operator/key pair is
/// a conflict, not an overwrite.
fn build_condition_block(
    capability: &str,
    conditions: &[Condition],
) -> Result<Option<ConditionBlock>, CanonizeError> {
    if conditions.is_empty() {
        return Ok(None);
    }
    let mut block: ConditionBlock = BTreeMap::new();
    for cond in conditions {
        let by_key = block.entry(cond.operator.to_string()).or_default();
        if by_key.contains_key(&cond.key) {
            return Err(CanonizeError::ConflictingCondition {
                capability: capability.to_string(),
                operator: cond.operator.to_string(),
                key: cond.key.clone(),
            });
        }
        by_key.insert(cond.key.clone(), condition_value_json(&cond.value));
    }
    Ok(Some(block))
}

fn condition_value_json(value: &ConditionValue) -> serde_json::Value {
    match value {
        ConditionValue::Scalar(s) => serde_json::Value::String(s.clone()),
        ConditionValue::List(items) => serde_json::Value::Array(
            items
                .iter()
                .cloned()
                .map(serde_json::Value::String)
                .collect(),
        ),
    }
}

fn deny_statement(must_never: &MustNever) -> Statement {
    Statement {
        sid: deny_statement_id(must_never),
        effect: Effect::Deny,
        action: must_never.actions.clone(),
        resource: must_never.resources.clone(),
        condition: None,
    }
}

/// Every Sid the capability may emit. S3 capabilities reserve all three
/// split suffixes whether or not each statement ends up non-empty.
pub fn allow_statement_ids(cap: &Capability) -> Vec<String> {
    let base = pascal_case(&cap.name);
    if cap.service == "s3" {
        S3_SPLIT_SUFFIXES
            .iter()
            .map(|suffix| format!("Allow{}{}", base, suffix))
            .collect()
    } else {
        vec![format!("Allow{}", base)]
    }
}

pub fn deny_statement_id(must_never: &MustNever) -> String {
    format!("Deny{}", pascal_case(&must_never.name))
}

/// "s3_read_bucket" → "S3ReadBucket". Any character outside `[A-Za-z0-9]`
/// separates words and is dropped.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
