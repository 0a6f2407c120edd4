// canonize_scenarios.rs — End-to-end spec → baseline policy scenarios.
//
// Flow:
//   1. Build a SpecDsl for read-only access to one bucket
//   2. validate → no violations
//   3. validate_and_canonize → bucket-level, object-level and deny statements
//   4. Repeat and compare bytes and digest
//
// Broken variants (no resources, wildcard-only resources) must not compile.

use iamc_spec::{
    validate, validate_and_canonize, ActionSelector, Capability, CapabilityMode, Condition,
    ConditionOp, Confidence, Effect, Evidence, MustNever, PolicyError, Principal, Rule, Scope,
    SpecDsl,
};

const MUTATING: &[&str] = &[
    "s3:PutObject",
    "s3:DeleteObject",
    "s3:PutObjectAcl",
    "s3:DeleteObjectVersion",
    "s3:PutBucketPolicy",
    "s3:DeleteBucket",
];

fn mybucket_spec(resources: Vec<String>) -> SpecDsl {
    let cap = Capability::new(
        "s3_read_bucket",
        "s3",
        ActionSelector::Mode(CapabilityMode::ReadOnly),
        resources,
    )
    .with_conditions(vec![Condition::new(
        "aws:SecureTransport",
        ConditionOp::Bool,
        "true".into(),
    )])
    .with_evidence(vec![Evidence::new(
        "https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListObjectsV2.html",
        Confidence::new(99).unwrap(),
        "ListBucket needed to enumerate objects",
    )]);

    SpecDsl::new(
        Principal {
            principal_ref: "arn:aws:iam::123456789012:role/reader".to_string(),
        },
        Scope {
            accounts: vec!["123456789012".to_string()],
            regions: vec!["us-east-1".to_string()],
        },
        vec![cap],
    )
    .with_must_never(vec![MustNever {
        name: "no_writes_deletes".to_string(),
        actions: vec!["s3:PutObject".to_string(), "s3:DeleteObject".to_string()],
        resources: vec![
            "arn:aws:s3:::mybucket".to_string(),
            "arn:aws:s3:::mybucket/*".to_string(),
        ],
        rationale: "Read-only".to_string(),
        evidence: vec![],
    }])
}

fn valid_resources() -> Vec<String> {
    vec![
        "arn:aws:s3:::mybucket".to_string(),
        "arn:aws:s3:::mybucket/*".to_string(),
    ]
}

#[test]
fn read_only_bucket_compiles_to_three_statements() {
    let spec = mybucket_spec(valid_resources());
    assert!(validate(&spec).is_empty());

    let baseline = validate_and_canonize(&spec).unwrap();
    let statements = baseline.document().statements();
    assert_eq!(statements.len(), 3);

    assert_eq!(statements[0].sid, "AllowS3ReadBucketBucketLevel");
    assert_eq!(statements[0].effect, Effect::Allow);
    assert_eq!(
        statements[0].action,
        vec!["s3:ListBucket", "s3:GetBucketLocation"]
    );
    assert_eq!(statements[0].resource, vec!["arn:aws:s3:::mybucket"]);

    assert_eq!(statements[1].sid, "AllowS3ReadBucketObjectLevel");
    assert_eq!(statements[1].action, vec!["s3:GetObject"]);
    assert_eq!(statements[1].resource, vec!["arn:aws:s3:::mybucket/*"]);

    for stmt in &statements[..2] {
        let block = stmt.condition.as_ref().unwrap();
        assert_eq!(block["Bool"]["aws:SecureTransport"], "true");
    }

    assert_eq!(statements[2].sid, "DenyNoWritesDeletes");
    assert_eq!(statements[2].effect, Effect::Deny);
    assert!(statements[2].condition.is_none());
}

#[test]
fn canonize_is_byte_identical_across_calls() {
    let spec = mybucket_spec(valid_resources());
    let first = validate_and_canonize(&spec).unwrap();
    let second = validate_and_canonize(&spec.clone()).unwrap();

    assert_eq!(
        first.document().to_json().unwrap(),
        second.document().to_json().unwrap()
    );
    assert_eq!(
        first.document().digest().unwrap(),
        second.document().digest().unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        first.document().to_json().unwrap()
    );
}

#[test]
fn read_only_allows_never_include_mutating_actions() {
    let baseline = validate_and_canonize(&mybucket_spec(valid_resources())).unwrap();
    for stmt in baseline.document().statements() {
        if stmt.effect == Effect::Allow {
            assert!(stmt.action.iter().all(|a| !MUTATING.contains(&a.as_str())));
        }
    }
}

#[test]
fn every_must_never_becomes_one_deny() {
    let mut spec = mybucket_spec(valid_resources());
    spec.must_never.push(MustNever {
        name: "no acl changes".to_string(),
        actions: vec!["s3:PutBucketAcl".to_string()],
        resources: vec!["arn:aws:s3:::mybucket".to_string()],
        rationale: "ACLs are managed centrally".to_string(),
        evidence: vec![],
    });

    let baseline = validate_and_canonize(&spec).unwrap();
    let denies: Vec<_> = baseline
        .document()
        .statements()
        .iter()
        .filter(|s| s.effect == Effect::Deny)
        .collect();
    assert_eq!(denies.len(), spec.must_never.len());
    assert!(denies.iter().all(|s| s.sid.starts_with("Deny")));
    assert_eq!(denies[1].sid, "DenyNoAclChanges");
}

#[test]
fn empty_resources_fail_closed() {
    let spec = mybucket_spec(vec![]);
    let violations = validate(&spec);
    assert!(violations.iter().any(|v| v.rule == Rule::NoResources));

    match validate_and_canonize(&spec) {
        Err(PolicyError::Validation(v)) => assert_eq!(v, violations),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn wildcard_resources_fail_closed() {
    let spec = mybucket_spec(vec!["*".to_string(), "*".to_string()]);
    let violations = validate(&spec);
    assert!(violations.iter().any(|v| v.rule == Rule::WildcardResources));

    let err = validate_and_canonize(&spec).unwrap_err();
    assert!(!err.violations().is_empty());
    assert!(err.to_string().contains("wildcard"));
}

#[test]
fn spec_json_roundtrip_rejects_mode_and_actions() {
    let spec = mybucket_spec(valid_resources());
    let json = spec.to_json_pretty().unwrap();
    assert_eq!(SpecDsl::from_json(&json).unwrap(), spec);

    let both = json.replacen(
        "\"mode\": \"read_only\"",
        "\"mode\": \"read_only\",\n      \"actions\": [\"s3:GetObject\"]",
        1,
    );
    let err = SpecDsl::from_json(&both).unwrap_err();
    assert!(err.to_string().contains("s3_read_bucket"));
}
