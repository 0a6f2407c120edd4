// readback.rs — First-draft read-back built straight from untyped intent.

use std::collections::BTreeSet;

use iamc_spec::ReadBack;

use crate::raw::UntypedIntent;

/// Extraction confidence below which a manual review callout is added.
pub const REVIEW_CONFIDENCE: f64 = 0.9;

/// Confidence assumed when the extractor does not report one.
pub const DEFAULT_EXTRACTION_CONFIDENCE: f64 = 0.5;

/// Draft a read-back from raw intent, before any guardrail pass.
pub fn draft_read_back(intent: &UntypedIntent) -> ReadBack {
    let services: BTreeSet<&str> = intent
        .capabilities
        .iter()
        .filter_map(|c| c.service.as_deref())
        .collect();
    let modes: BTreeSet<&str> = intent
        .capabilities
        .iter()
        .filter_map(|c| c.mode.as_deref())
        .collect();

    let summary = format!(
        "Intent extracted: {} access to {} services. Found {} capabilities and {} restrictions.",
        join(&modes),
        join(&services),
        intent.capabilities.len(),
        intent.must_never.len()
    );

    let mut bullets: Vec<String> = intent
        .capabilities
        .iter()
        .map(|c| {
            format!(
                "{} access to {}",
                capitalize(&c.mode.as_deref().unwrap_or("custom").replace('_', " ")),
                c.service.as_deref().unwrap_or("unknown")
            )
        })
        .collect();
    bullets.extend(intent.must_never.iter().map(|m| {
        let what = m
            .rationale
            .as_deref()
            .or(m.name.as_deref())
            .unwrap_or("unnamed restriction");
        format!("Deny: {}", what)
    }));

    let mut risk_callouts = Vec::new();
    let any_wildcard = intent
        .capabilities
        .iter()
        .flat_map(|c| c.resources.iter().flatten())
        .any(|r| r == "*");
    if any_wildcard {
        risk_callouts.push("Wildcard resources detected - scope may be too broad".to_string());
    }
    if intent.must_never.is_empty() {
        risk_callouts.push("No explicit restrictions - consider adding deny statements".to_string());
    }
    let confidence = intent.confidence.unwrap_or(DEFAULT_EXTRACTION_CONFIDENCE);
    if confidence < REVIEW_CONFIDENCE {
        risk_callouts.push(format!(
            "Extraction confidence {:.0}% - manual review recommended",
            confidence * 100.0
        ));
    }

    ReadBack {
        summary,
        bullets,
        assumptions: intent.assumptions.clone(),
        risk_callouts,
    }
}

fn join(set: &BTreeSet<&str>) -> String {
    set.iter().copied().collect::<Vec<_>>().join(", ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
