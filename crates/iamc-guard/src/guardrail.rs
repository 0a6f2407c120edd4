// guardrail.rs — Security and completeness review of a SpecDsl.
//
// The auditor never fails. It reads a spec (validated or not) plus the
// evidence index it was built from, and returns a copy of the read-back
// with extra assumptions and risk callouts. Output lists are deduplicated
// and sorted, so the result does not depend on check order.
//
// Checks:
// A. Placeholder principal, accounts, regions and resource ARNs
// B. Validator violations, lifted into assumptions or risk callouts
// C. S3 read-only hardening: HTTPS, network restriction, explicit denials
// D. Over-broad wildcards
// E. Missing or weak evidence, thin evidence index
// F. S3 read-only bucket/object ARN pairing

use std::panic::{self, AssertUnwindSafe};

use iamc_spec::evidence::min_confidence;
use iamc_spec::evidence_index::category;
use iamc_spec::{
    Capability, CoreConfig, DslValidator, EvidenceIndex, ReadBack, ServiceRegistry, SpecDsl,
    Violation, PRINCIPAL_PLACEHOLDER,
};

pub const NETWORK_CONDITION_KEYS: &[&str] = &["aws:SourceIp", "aws:SourceVpc", "aws:SourceVpce"];

const ACCOUNT_PLACEHOLDER: &str = "ACCOUNT_ID";
const S3_PLACEHOLDERS: &[&str] = &["BUCKET_NAME", "<BUCKET>"];
const KMS_PLACEHOLDERS: &[&str] = &["KMS_KEY_ARN", "<KEY>"];

/// Guardrail reviewer bound to one registry and confidence floor.
#[derive(Debug, Clone, Copy)]
pub struct GuardrailAuditor<'r> {
    validator: DslValidator<'r>,
    verbose: bool,
}

impl<'r> GuardrailAuditor<'r> {
    pub fn new(registry: &'r ServiceRegistry) -> Self {
        Self {
            validator: DslValidator::new(registry),
            verbose: true,
        }
    }

    pub fn from_config(config: &CoreConfig, registry: &'r ServiceRegistry) -> Self {
        Self {
            validator: config.validator(registry),
            verbose: config.guardrails.verbose,
        }
    }

    pub fn with_min_confidence(mut self, floor: u8) -> Self {
        self.validator = self.validator.with_min_confidence(floor);
        self
    }

    /// Whether an internal validation failure becomes a risk callout.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Return `read_back` augmented with every finding for `spec`.
    pub fn audit(
        &self,
        read_back: &ReadBack,
        spec: &SpecDsl,
        index: &EvidenceIndex,
        prompt: &str,
    ) -> ReadBack {
        let mut assumptions = Vec::new();
        let mut risks = Vec::new();

        placeholder_findings(spec, &mut assumptions);
        self.lift_violations(spec, &mut assumptions, &mut risks);
        hardening_findings(spec, &mut risks);
        self.evidence_findings(spec, index, &mut risks);
        arn_pair_findings(spec, &mut risks);

        tracing::debug!(
            prompt_chars = prompt.chars().count(),
            assumptions = assumptions.len(),
            risk_callouts = risks.len(),
            "guardrail audit complete"
        );
        read_back.augmented(assumptions, risks)
    }

    fn lift_violations(
        &self,
        spec: &SpecDsl,
        assumptions: &mut Vec<String>,
        risks: &mut Vec<String>,
    ) {
        let validator = self.validator;
        lift_checked(|| validator.validate(spec), self.verbose, assumptions, risks);
    }

    fn evidence_findings(&self, spec: &SpecDsl, index: &EvidenceIndex, risks: &mut Vec<String>) {
        let floor = self.validator.min_confidence();
        for cap in &spec.capabilities {
            match min_confidence(&cap.evidence) {
                None => risks.push(format!(
                    "No evidence citations attached for {} - results may rely on heuristics.",
                    cap.name
                )),
                Some(lowest) if lowest < floor => risks.push(format!(
                    "Evidence confidence below {}% for {}.",
                    floor, cap.name
                )),
                Some(_) => {}
            }
        }

        let thin = !index.has(category::S3_LIST) && !index.has(category::S3_GET);
        if thin && spec.capabilities.iter().any(Capability::is_s3_read_only) {
            risks.push(
                "RAG coverage for action-to-policy mappings looks thin; ingest the Service \
                 Authorization Reference: Actions, resources and condition keys."
                    .to_string(),
            );
        }
    }
}

/// Audit with the built-in registry and default settings.
pub fn audit(read_back: &ReadBack, spec: &SpecDsl, index: &EvidenceIndex, prompt: &str) -> ReadBack {
    GuardrailAuditor::new(ServiceRegistry::global()).audit(read_back, spec, index, prompt)
}

/// Run `check` and lift its violations. A panicking check becomes a risk
/// callout when `verbose`, and is only logged otherwise.
fn lift_checked<F>(
    check: F,
    verbose: bool,
    assumptions: &mut Vec<String>,
    risks: &mut Vec<String>,
) where
    F: FnOnce() -> Vec<Violation>,
{
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(violations) => {
            for v in violations {
                let (target, line) = lift(&v);
                match target {
                    Lift::Assumption => assumptions.push(line),
                    Lift::Risk => risks.push(line),
                }
            }
        }
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::warn!(%reason, "validation check failed during guardrail audit");
            if verbose {
                risks.push(format!("Validation check failed: {}", reason));
            }
        }
    }
}

enum Lift {
    Assumption,
    Risk,
}

/// Missing input becomes a question for the requester; anything else is a
/// risk for the reviewer.
fn lift(v: &Violation) -> (Lift, String) {
    let line = format!("Validation: {}", v);
    if v.rule.is_missing_input() {
        (Lift::Assumption, line)
    } else {
        (Lift::Risk, line)
    }
}

fn placeholder_findings(spec: &SpecDsl, assumptions: &mut Vec<String>) {
    let principal = spec.who.principal_ref.trim();
    if principal.is_empty() || principal.contains(PRINCIPAL_PLACEHOLDER) {
        assumptions.push("Provide the exact principal ARN (who principal_ref).".to_string());
    }

    let accounts = &spec.scope.accounts;
    if accounts.is_empty() || accounts.iter().any(|a| !is_account_id(a)) {
        assumptions.push("Provide target AWS account ID(s).".to_string());
    }

    if spec.scope.regions.is_empty() {
        assumptions.push("Confirm allowed AWS region(s).".to_string());
    }

    for cap in &spec.capabilities {
        match cap.service.as_str() {
            "s3" if cap.resources.is_empty() || has_placeholder(cap, S3_PLACEHOLDERS) => {
                assumptions.push("Provide the exact S3 bucket name(s) and object ARN(s).".to_string())
            }
            "kms" if has_placeholder(cap, KMS_PLACEHOLDERS) => {
                assumptions.push("Provide the exact KMS key ARN(s).".to_string())
            }
            _ => {}
        }
    }
}

/// Twelve ASCII digits, and not the literal placeholder.
fn is_account_id(account: &str) -> bool {
    !account.contains(ACCOUNT_PLACEHOLDER)
        && account.len() == 12
        && account.bytes().all(|b| b.is_ascii_digit())
}

fn has_placeholder(cap: &Capability, markers: &[&str]) -> bool {
    cap.resources
        .iter()
        .any(|r| markers.iter().any(|m| r.contains(m)))
}

fn hardening_findings(spec: &SpecDsl, risks: &mut Vec<String>) {
    let mut any_s3_read_only = false;
    for cap in &spec.capabilities {
        if cap.is_s3_read_only() {
            any_s3_read_only = true;
            let secure_transport = cap
                .conditions
                .iter()
                .any(|c| c.key == "aws:SecureTransport" && c.value.is_scalar("true"));
            if !secure_transport {
                risks.push("HTTPS enforcement missing (aws:SecureTransport=true).".to_string());
            }
            let network = cap
                .conditions
                .iter()
                .any(|c| NETWORK_CONDITION_KEYS.contains(&c.key.as_str()));
            if !network {
                risks.push(
                    "No network restriction (IP/VPC); consider narrowing blast radius.".to_string(),
                );
            }
        }

        if cap
            .resources
            .iter()
            .any(|r| r.contains('*') && !is_reasonable_wildcard(r))
        {
            risks.push("Over-broad resource scope (wildcard).".to_string());
        }
    }

    if any_s3_read_only && spec.must_never.is_empty() {
        risks.push("No explicit deny statements for write/delete.".to_string());
    }
}

/// `arn:aws:s3:::bucket/*` is a reasonable wildcard; a bare `*` or any
/// other wildcard is not.
pub fn is_reasonable_wildcard(resource: &str) -> bool {
    resource != "*" && resource.contains("arn:aws:s3:::") && resource.ends_with("/*")
}

fn arn_pair_findings(spec: &SpecDsl, risks: &mut Vec<String>) {
    for cap in spec.capabilities.iter().filter(|c| c.is_s3_read_only()) {
        let has_bucket = cap
            .resources
            .iter()
            .any(|r| !r.ends_with(":::*") && !r.contains("/*"));
        let has_object = cap.resources.iter().any(|r| r.contains("/*"));
        if !has_bucket || !has_object {
            risks.push(
                "S3 read requires both bucket ARN (arn:aws:s3:::bucket) and object ARN \
                 (arn:aws:s3:::bucket/*)."
                    .to_string(),
            );
        }
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
