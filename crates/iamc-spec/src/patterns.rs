// patterns.rs — Ready-made specs for common access requests.

use crate::dsl::{
    ActionSelector, Capability, CapabilityMode, Condition, ConditionOp, MustNever, Principal,
    Scope, SpecDsl,
};
use crate::evidence::{Confidence, Evidence};

/// Options for [`s3_read_only`].
#[derive(Debug, Clone, Default)]
pub struct S3ReadOnlyOptions {
    /// Adds a kms:Decrypt capability on this key, for SSE-KMS buckets.
    pub kms_key_arn: Option<String>,
    pub vpc_endpoint: Option<String>,
    pub source_ip: Option<String>,
}

/// Actions the standard read-only denial blocks.
pub const S3_WRITE_DELETE_ACTIONS: &[&str] = &[
    "s3:PutObject",
    "s3:PutObjectAcl",
    "s3:DeleteObject",
    "s3:DeleteObjectVersion",
    "s3:PutBucketAcl",
    "s3:DeleteBucket",
    "s3:DeleteBucketPolicy",
    "s3:PutBucketPolicy",
];

/// Standard denial of S3 writes and deletes over `resources`.
pub fn s3_no_writes_deletes(name: &str, resources: Vec<String>) -> MustNever {
    MustNever {
        name: name.to_string(),
        actions: S3_WRITE_DELETE_ACTIONS
            .iter()
            .map(|a| a.to_string())
            .collect(),
        resources,
        rationale: "Read-only scope - block all write and delete operations".to_string(),
        evidence: Vec::new(),
    }
}

fn cite(doc_url: &str, confidence: u8, rationale: &str) -> Evidence {
    Evidence::new(doc_url, Confidence::saturating(confidence), rationale)
}

/// Read-only access to one bucket: HTTPS enforced, optional network
/// restrictions, optional KMS decrypt, and an explicit write/delete denial.
pub fn s3_read_only(bucket: &str, options: &S3ReadOnlyOptions) -> SpecDsl {
    let secure_transport = Condition::new("aws:SecureTransport", ConditionOp::Bool, "true".into())
        .with_evidence(vec![cite(
            "https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_policies_condition-keys.html#condition-keys-securetransport",
            99,
            "Enforce HTTPS for all requests",
        )]);
    let mut conditions = vec![secure_transport];

    if let Some(ip) = &options.source_ip {
        conditions.push(
            Condition::new("aws:SourceIp", ConditionOp::IpAddress, ip.as_str().into())
                .with_evidence(vec![cite(
                    "https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_policies_condition-keys.html#condition-keys-sourceip",
                    95,
                    "Restrict access to specific IP range",
                )]),
        );
    }

    if let Some(vpce) = &options.vpc_endpoint {
        conditions.push(
            Condition::new("aws:SourceVpce", ConditionOp::StringEquals, vpce.as_str().into())
                .with_evidence(vec![cite(
                    "https://docs.aws.amazon.com/vpc/latest/userguide/vpce-policy.html",
                    96,
                    "Restrict access via VPC endpoint",
                )]),
        );
    }

    let resources = vec![
        format!("arn:aws:s3:::{}", bucket),
        format!("arn:aws:s3:::{}/*", bucket),
    ];

    let mut capabilities = vec![Capability::new(
        "s3_read_bucket",
        "s3",
        ActionSelector::Mode(CapabilityMode::ReadOnly),
        resources.clone(),
    )
    .with_conditions(conditions)
    .with_evidence(vec![
        cite(
            "https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListObjectsV2.html",
            100,
            "ListBucket needed to enumerate objects",
        ),
        cite(
            "https://docs.aws.amazon.com/AmazonS3/latest/API/API_GetObject.html",
            100,
            "GetObject needed to fetch content",
        ),
    ])];

    if let Some(key) = &options.kms_key_arn {
        capabilities.push(
            Capability::new(
                "s3_kms_decrypt",
                "kms",
                ActionSelector::Explicit(vec!["kms:Decrypt".to_string()]),
                vec![key.clone()],
            )
            .with_evidence(vec![cite(
                "https://docs.aws.amazon.com/kms/latest/developerguide/services-s3.html",
                95,
                "Decrypt required for SSE-KMS objects",
            )]),
        );
    }

    SpecDsl::new(
        Principal {
            principal_ref: "<PRINCIPAL_ARN>".to_string(),
        },
        Scope {
            accounts: vec!["<ACCOUNT>".to_string()],
            regions: vec!["us-east-1".to_string()],
        },
        capabilities,
    )
    .with_must_never(vec![s3_no_writes_deletes("no_writes_deletes", resources)])
    .with_notes(vec![format!("Read-only access to S3 bucket: {}", bucket)])
}
