// snippets.rs — Build an evidence index from retrieved documentation snippets.
//
// Each snippet is scanned for a fixed set of action and condition-key
// markers. Every hit becomes one Evidence, filed under the category its
// rationale maps to, with the retrieval score as confidence and the snippet
// head as the quote.

use chrono::{DateTime, Utc};
use iamc_spec::evidence_index::category;
use iamc_spec::{Confidence, Evidence, EvidenceIndex};
use serde::{Deserialize, Serialize};

/// One retrieved documentation chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    pub text: String,
    /// Similarity score in 0.0..=1.0.
    #[serde(default)]
    pub score: f64,
    /// Source URL, when the retriever knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Snippet {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
            source: None,
        }
    }
}

enum Needle {
    /// Case-sensitive substring.
    Exact(&'static str),
    /// Any of these, matched against the lowercased text.
    AnyLower(&'static [&'static str]),
}

impl Needle {
    fn found_in(&self, text: &str, lower: &str) -> bool {
        match self {
            Needle::Exact(s) => text.contains(*s),
            Needle::AnyLower(words) => words.iter().any(|w| lower.contains(*w)),
        }
    }
}

struct Marker {
    needle: Needle,
    rationale: &'static str,
}

const MARKERS: &[Marker] = &[
    Marker {
        needle: Needle::Exact("s3:ListBucket"),
        rationale: "ListBucket required for bucket enumeration",
    },
    Marker {
        needle: Needle::Exact("s3:GetObject"),
        rationale: "GetObject required for object access",
    },
    Marker {
        needle: Needle::Exact("aws:SecureTransport"),
        rationale: "SecureTransport enforces HTTPS",
    },
    Marker {
        needle: Needle::Exact("aws:SourceIp"),
        rationale: "SourceIp restricts the network origin of requests",
    },
    Marker {
        needle: Needle::AnyLower(&["aws:sourcevpc"]),
        rationale: "SourceVpc/SourceVpce restrict requests to a VPC path",
    },
    Marker {
        needle: Needle::AnyLower(&["least privilege", "minimal", "read-only"]),
        rationale: "Security best practice guidance",
    },
];

/// Category for a free-form evidence rationale.
pub fn categorize(rationale: &str) -> &'static str {
    let lower = rationale.to_lowercase();
    if lower.contains("listbucket") {
        category::S3_LIST
    } else if lower.contains("getobject") {
        category::S3_GET
    } else if lower.contains("securetransport") {
        category::SECURE_TRANSPORT
    } else if lower.contains("sourceip") {
        category::IP_RESTRICTION
    } else if lower.contains("sourcevpc") {
        category::VPC_RESTRICTION
    } else if lower.contains("best practice") {
        category::SECURITY
    } else {
        category::GENERAL
    }
}

/// Scan snippets into a category-keyed evidence index, stamping every
/// entry with `retrieved_at`.
pub fn from_snippets(snippets: &[Snippet], retrieved_at: DateTime<Utc>) -> EvidenceIndex {
    let mut index = EvidenceIndex::new();
    for (i, snippet) in snippets.iter().enumerate() {
        let lower = snippet.text.to_lowercase();
        let doc_url = snippet
            .source
            .clone()
            .unwrap_or_else(|| format!("aws-iam-docs-chunk-{}", i));
        let confidence = Confidence::from_score(snippet.score);

        for marker in MARKERS
            .iter()
            .filter(|m| m.needle.found_in(&snippet.text, &lower))
        {
            index.insert(
                categorize(marker.rationale),
                Evidence::new(doc_url.clone(), confidence, marker.rationale)
                    .retrieved_at(retrieved_at)
                    .with_quote(&snippet.text),
            );
        }
    }
    tracing::debug!(
        snippets = snippets.len(),
        categories = index.categories().count(),
        "built evidence index"
    );
    index
}
