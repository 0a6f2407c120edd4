// pipeline.rs — Full compilation session, from extraction output to artifacts.
//
// Flow:
//   1. Snippets → evidence index
//   2. Untyped intent → SpecDsl (adapter defaults left in place)
//   3. Draft read-back → guardrail audit
//   4. validate_and_canonize → baseline
//   5. Candidate policy (from JSON, as an external generator would send it)
//   6. PolicyArtifacts + analysis
//
// The adapter's placeholders must surface as assumptions, never as silent
// defaults in a deployed policy.

use chrono::{TimeZone, Utc};
use iamc_guard::{compare, GuardrailAuditor, PolicyArtifacts};
use iamc_intent::{draft_read_back, from_snippets, IntentAdapter, Snippet, UntypedIntent};
use iamc_spec::{validate_and_canonize, CandidatePolicy, CoreConfig, ServiceRegistry};

const PROMPT: &str = "Let the reporting role read objects in the finance-reports bucket over HTTPS.";

const EXTRACTION: &str = r#"{
    "capabilities": [{
        "service": "s3",
        "mode": "read_only",
        "resources": ["arn:aws:s3:::finance-reports", "arn:aws:s3:::finance-reports/*"],
        "conditions": [
            {"key": "aws:SecureTransport", "op": "Bool", "value": true},
            {"key": "aws:SourceVpce", "op": "StringEquals", "value": "vpce-0f1e2d"}
        ]
    }],
    "assumptions": [],
    "confidence": 0.95
}"#;

const CANDIDATE: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Sid": "ReadReports",
            "Effect": "Allow",
            "Action": ["s3:ListBucket", "s3:GetObject"],
            "Resource": ["arn:aws:s3:::finance-reports", "arn:aws:s3:::finance-reports/*"],
            "Condition": {"Bool": {"aws:SecureTransport": "true"}}
        },
        {
            "Effect": "Deny",
            "Action": "s3:DeleteObject",
            "Resource": "arn:aws:s3:::finance-reports/*"
        }
    ]
}"#;

fn snippets() -> Vec<Snippet> {
    vec![
        Snippet::new("s3:ListBucket lists objects in a bucket.", 0.94),
        Snippet::new("s3:GetObject retrieves an object. Prefer read-only grants.", 0.93),
        Snippet::new("aws:SecureTransport is false for plain HTTP requests.", 0.97),
    ]
}

#[test]
fn session_from_intent_to_artifacts() {
    let at = Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap();
    let config = CoreConfig::default();
    let registry: ServiceRegistry = config.service_registry().unwrap();

    // 1–2
    let index = from_snippets(&snippets(), at);
    let intent = UntypedIntent::from_json(EXTRACTION).unwrap();
    let spec = IntentAdapter::new(config.adapter.clone())
        .adapt_intent(&intent, &index)
        .unwrap();

    // 3
    let draft = draft_read_back(&intent);
    assert!(draft.risk_callouts[0].starts_with("No explicit restrictions"));
    let read_back =
        GuardrailAuditor::from_config(&config, &registry).audit(&draft, &spec, &index, PROMPT);
    assert_eq!(
        read_back.assumptions,
        vec![
            "Provide target AWS account ID(s).",
            "Provide the exact principal ARN (who principal_ref).",
        ]
    );
    // The adapter synthesized a denial and both hardening conditions exist.
    assert!(!read_back
        .risk_callouts
        .iter()
        .any(|r| r.starts_with("No explicit deny") || r.starts_with("HTTPS")));
    let mut sorted = read_back.risk_callouts.clone();
    sorted.sort();
    assert_eq!(sorted, read_back.risk_callouts);

    // 4
    let baseline = validate_and_canonize(&spec).unwrap();
    assert_eq!(baseline.document().statements().len(), 3);

    // 5
    let candidate = CandidatePolicy::from_json(CANDIDATE).unwrap();
    let report = compare(baseline.document(), &candidate);
    assert_eq!(
        report.baseline_only_actions,
        vec![
            "s3:DeleteBucket",
            "s3:DeleteBucketPolicy",
            "s3:DeleteObjectVersion",
            "s3:GetBucketLocation",
            "s3:PutBucketAcl",
            "s3:PutBucketPolicy",
            "s3:PutObject",
            "s3:PutObjectAcl",
        ]
    );
    assert!(report.candidate_only_actions.is_empty());
    assert_eq!(report.resources_overlap, 1.0);
    assert!(report.alignment_score > 0.0 && report.alignment_score < 1.0);

    // 6
    let artifacts = PolicyArtifacts::new(
        read_back,
        spec,
        baseline,
        candidate,
        intent.confidence.unwrap_or(0.5),
        0.85,
    )
    .unwrap();
    let analysis = artifacts.analysis().unwrap();
    assert_eq!(analysis.comparison, report);
    assert_eq!(analysis.capability_count, 1);
    assert_eq!(analysis.restriction_count, 1);
    // Two service citations plus one per condition; SourceVpce falls back
    // to the security category (chunk 1).
    assert_eq!(analysis.evidence_count, 4);
    assert_eq!(
        analysis.evidence_sources,
        vec!["aws-iam-docs-chunk-0", "aws-iam-docs-chunk-1", "aws-iam-docs-chunk-2"]
    );
    assert_ne!(analysis.baseline_digest, analysis.candidate_digest);
}

#[test]
fn unvalidated_spec_still_audited() {
    let intent =
        UntypedIntent::from_json(r#"{"capabilities": [{"service": "s3", "resources": ["*"]}]}"#)
            .unwrap();
    let index = from_snippets(&[], Utc::now());
    let spec = IntentAdapter::default().adapt_intent(&intent, &index).unwrap();

    assert!(validate_and_canonize(&spec).is_err());

    let registry = ServiceRegistry::builtin();
    let rb = GuardrailAuditor::new(&registry).audit(
        &draft_read_back(&intent),
        &spec,
        &index,
        "read it all",
    );
    for expected in [
        "Over-broad resource scope (wildcard).",
        "HTTPS enforcement missing (aws:SecureTransport=true).",
        "Wildcard resources detected - scope may be too broad",
    ] {
        assert!(
            rb.risk_callouts.iter().any(|r| r == expected),
            "missing {:?} in {:?}",
            expected,
            rb.risk_callouts
        );
    }
    assert!(rb
        .risk_callouts
        .iter()
        .any(|r| r.starts_with("RAG coverage")));
    assert!(rb
        .assumptions
        .iter()
        .any(|a| a.starts_with("Validation: ") && a.contains("object-level")));
}
