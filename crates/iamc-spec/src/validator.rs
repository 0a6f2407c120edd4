// validator.rs — Spec DSL invariant checks.
//
// The validator is a total function: it never fails and always returns the
// complete set of violations so a caller can show one full report.
//
// Checks, per capability:
// 1. Service is registered (unregistered → skip this capability's other checks)
// 2. Explicit action lists are non-empty; modes resolve in the registry
// 3. Resources are present and not exclusively "*"
// 4. Condition keys are whitelisted for the service, and no operator/key
//    pair appears twice
// 5. Minimum evidence confidence meets the floor
// 6. S3 read_only grants name both a bucket ARN and an object ARN
//
// Document-level checks: the DSL version, and statement ids stay unique
// across capabilities and must-never entries once names are normalized.

use std::collections::BTreeSet;

use crate::canonizer::{allow_statement_ids, deny_statement_id};
use crate::dsl::{ActionSelector, Capability, SpecDsl, DSL_VERSION};
use crate::evidence::min_confidence;
use crate::registry::ServiceRegistry;
use crate::violation::{Rule, Violation};

/// Minimum evidence confidence a capability must carry.
pub const DEFAULT_MIN_CONFIDENCE: u8 = 80;

/// Whether a resource ARN addresses objects (`.../*`) rather than a bucket.
pub fn is_object_arn(resource: &str) -> bool {
    resource.ends_with("/*")
}

/// Validates spec documents against a service registry.
#[derive(Debug, Clone, Copy)]
pub struct DslValidator<'r> {
    registry: &'r ServiceRegistry,
    min_confidence: u8,
}

impl<'r> DslValidator<'r> {
    pub fn new(registry: &'r ServiceRegistry) -> Self {
        Self {
            registry,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, floor: u8) -> Self {
        self.min_confidence = floor;
        self
    }

    pub fn min_confidence(&self) -> u8 {
        self.min_confidence
    }

    pub fn registry(&self) -> &'r ServiceRegistry {
        self.registry
    }

    /// Return every violation in `spec`, in document order.
    pub fn validate(&self, spec: &SpecDsl) -> Vec<Violation> {
        let mut violations = Vec::new();

        if spec.version != DSL_VERSION {
            violations.push(Violation::new(
                None,
                Rule::UnsupportedVersion {
                    found: spec.version.clone(),
                },
            ));
        }

        let mut sids = BTreeSet::new();
        for cap in &spec.capabilities {
            self.validate_capability(cap, &mut violations);
            claim_sids(&cap.name, allow_statement_ids(cap), &mut sids, &mut violations);
        }
        for must_never in &spec.must_never {
            claim_sids(
                &must_never.name,
                vec![deny_statement_id(must_never)],
                &mut sids,
                &mut violations,
            );
        }

        violations
    }

    pub fn is_valid(&self, spec: &SpecDsl) -> bool {
        self.validate(spec).is_empty()
    }

    fn validate_capability(&self, cap: &Capability, out: &mut Vec<Violation>) {
        let name = Some(cap.name.as_str());
        let Some(service) = self.registry.get(&cap.service) else {
            out.push(Violation::new(
                name,
                Rule::UnknownService {
                    service: cap.service.clone(),
                },
            ));
            return;
        };

        match &cap.selector {
            ActionSelector::Explicit(actions) if actions.is_empty() => {
                out.push(Violation::new(name, Rule::MissingActionSelector));
            }
            ActionSelector::Mode(mode) if service.actions_for(*mode).is_none() => {
                out.push(Violation::new(
                    name,
                    Rule::UnresolvableMode {
                        service: cap.service.clone(),
                        mode: mode.to_string(),
                    },
                ));
            }
            _ => {}
        }

        if cap.resources.is_empty() {
            out.push(Violation::new(name, Rule::NoResources));
        } else if cap.resources.iter().all(|r| r == "*") {
            out.push(Violation::new(name, Rule::WildcardResources));
        }

        let mut seen = BTreeSet::new();
        for cond in &cap.conditions {
            if !service.allows_condition_key(&cond.key) {
                out.push(Violation::new(
                    name,
                    Rule::ConditionKeyNotAllowed {
                        key: cond.key.clone(),
                        service: cap.service.clone(),
                    },
                ));
            }
            if !seen.insert((cond.operator, cond.key.as_str())) {
                out.push(Violation::new(
                    name,
                    Rule::DuplicateCondition {
                        operator: cond.operator.to_string(),
                        key: cond.key.clone(),
                    },
                ));
            }
        }

        // No evidence counts as zero confidence.
        if min_confidence(&cap.evidence).unwrap_or(0) < self.min_confidence {
            out.push(Violation::new(
                name,
                Rule::LowConfidence {
                    floor: self.min_confidence,
                },
            ));
        }

        if cap.is_s3_read_only() {
            if !cap.resources.iter().any(|r| !is_object_arn(r)) {
                out.push(Violation::new(name, Rule::MissingBucketArn));
            }
            if !cap.resources.iter().any(|r| is_object_arn(r)) {
                out.push(Violation::new(name, Rule::MissingObjectArn));
            }
        }
    }
}

/// Record `ids` as taken; report the first one an earlier entry already holds.
fn claim_sids(
    entry: &str,
    ids: Vec<String>,
    taken: &mut BTreeSet<String>,
    out: &mut Vec<Violation>,
) {
    let mut reported = false;
    for sid in ids {
        if taken.contains(&sid) {
            if !reported {
                out.push(Violation::new(Some(entry), Rule::DuplicateStatementId { sid }));
                reported = true;
            }
        } else {
            taken.insert(sid);
        }
    }
}

/// Validate against the built-in registry and default confidence floor.
pub fn validate(spec: &SpecDsl) -> Vec<Violation> {
    DslValidator::new(ServiceRegistry::global()).validate(spec)
}

pub fn is_valid(spec: &SpecDsl) -> bool {
    validate(spec).is_empty()
}
