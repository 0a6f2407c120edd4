// adapt_flow.rs — Extraction output + retrieved snippets → validated baseline.
//
// Flow:
//   1. Scan documentation snippets into an evidence index
//   2. Parse the extractor's untyped JSON
//   3. Adapt into a SpecDsl (defaults, evidence, synthesized denial)
//   4. validate_and_canonize → baseline policy
//
// Thin evidence must surface as validator violations instead of a baseline.

use chrono::{TimeZone, Utc};
use iamc_intent::{draft_read_back, from_snippets, IntentAdapter, Snippet, UntypedIntent};
use iamc_spec::config::AdapterConfig;
use iamc_spec::{validate, validate_and_canonize, Effect, Rule};

const EXTRACTION: &str = r#"{
    "capabilities": [{
        "name": "s3_read_bucket",
        "service": "s3",
        "resources": ["arn:aws:s3:::analytics", "arn:aws:s3:::analytics/*"],
        "conditions": [{"key": "aws:SecureTransport", "op": "Bool", "value": "true"}]
    }],
    "assumptions": ["Requester owns the analytics bucket"],
    "confidence": 0.93
}"#;

fn snippets(score: f64) -> Vec<Snippet> {
    vec![
        Snippet::new(
            "s3:ListBucket grants permission to list some or all of the objects in a bucket.",
            score,
        ),
        Snippet::new(
            "s3:GetObject retrieves objects. Grant read-only access where possible.",
            score,
        ),
        Snippet::new(
            "Use the aws:SecureTransport condition key to deny requests over HTTP.",
            score,
        ),
    ]
}

#[test]
fn extraction_compiles_to_baseline() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    let index = from_snippets(&snippets(0.91), at);
    let intent = UntypedIntent::from_json(EXTRACTION).unwrap();

    let spec = IntentAdapter::default().adapt_intent(&intent, &index).unwrap();
    assert_eq!(spec.capabilities[0].evidence.len(), 2);
    assert!(spec.capabilities[0]
        .evidence
        .iter()
        .all(|e| e.retrieved_at == at));
    assert_eq!(spec.must_never.len(), 1);
    assert!(validate(&spec).is_empty());

    let baseline = validate_and_canonize(&spec).unwrap();
    let sids: Vec<&str> = baseline
        .document()
        .statements()
        .iter()
        .map(|s| s.sid.as_str())
        .collect();
    assert_eq!(
        sids,
        vec![
            "AllowS3ReadBucketBucketLevel",
            "AllowS3ReadBucketObjectLevel",
            "DenyNoS3WritesDeletes"
        ]
    );
    assert_eq!(baseline.document().statements()[2].effect, Effect::Deny);

    let rb = draft_read_back(&intent);
    assert_eq!(rb.assumptions, vec!["Requester owns the analytics bucket"]);
}

#[test]
fn low_scoring_snippets_fail_validation() {
    let index = from_snippets(&snippets(0.6), Utc::now());
    let intent = UntypedIntent::from_json(EXTRACTION).unwrap();
    let spec = IntentAdapter::default().adapt_intent(&intent, &index).unwrap();

    let violations = validate(&spec);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule, Rule::LowConfidence { floor: 80 });
    assert!(validate_and_canonize(&spec).is_err());
}

#[test]
fn configured_placeholders_flow_into_spec() {
    let adapter = IntentAdapter::new(AdapterConfig {
        principal_ref: "arn:aws:iam::123456789012:role/analyst".to_string(),
        accounts: vec!["123456789012".to_string()],
        regions: vec!["eu-central-1".to_string()],
    });
    let intent = UntypedIntent::from_json(r#"{"capabilities": [{"service": "s3"}]}"#).unwrap();
    let spec = adapter
        .adapt_intent(&intent, &from_snippets(&[], Utc::now()))
        .unwrap();

    assert_eq!(spec.who.principal_ref, "arn:aws:iam::123456789012:role/analyst");
    assert_eq!(spec.scope.regions, vec!["eu-central-1"]);
    assert!(spec.capabilities[0].resources[0].contains("<BUCKET>"));
    // No evidence at all is below the floor.
    assert!(validate(&spec)
        .iter()
        .any(|v| matches!(v.rule, Rule::LowConfidence { .. })));
}
