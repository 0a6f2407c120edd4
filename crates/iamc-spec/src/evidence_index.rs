// evidence_index.rs — Category-keyed evidence supplied alongside raw intent.
//
// The index is built outside the core from retrieved documentation and is
// only read here. Lookups always return owned vectors so the adapter can
// attach them to spec entities without borrowing the index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;

/// Well-known category names.
pub mod category {
    pub const S3_LIST: &str = "s3_list";
    pub const S3_GET: &str = "s3_get";
    pub const SECURE_TRANSPORT: &str = "secure_transport";
    pub const IP_RESTRICTION: &str = "ip_restriction";
    pub const VPC_RESTRICTION: &str = "vpc_restriction";
    pub const SECURITY: &str = "security";
    pub const GENERAL: &str = "general";
}

/// Mapping from category name to the evidence filed under it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EvidenceIndex {
    categories: BTreeMap<String, Vec<Evidence>>,
}

impl EvidenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// File one piece of evidence under a category.
    pub fn insert(&mut self, category: impl Into<String>, evidence: Evidence) {
        self.categories
            .entry(category.into())
            .or_default()
            .push(evidence);
    }

    pub fn get(&self, category: &str) -> &[Evidence] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a category holds at least one piece of evidence.
    pub fn has(&self, category: &str) -> bool {
        !self.get(category).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// First non-empty category in `chain`, or nothing.
    fn first_of(&self, chain: &[&str]) -> Vec<Evidence> {
        chain
            .iter()
            .map(|c| self.get(c))
            .find(|ev| !ev.is_empty())
            .map(<[Evidence]>::to_vec)
            .unwrap_or_default()
    }

    /// Evidence for a condition key, matched case-insensitively on the key.
    pub fn for_condition_key(&self, key: &str) -> Vec<Evidence> {
        let lk = key.to_lowercase();
        if lk.contains("securetransport") {
            return self.get(category::SECURE_TRANSPORT).to_vec();
        }
        if lk.contains("sourceip") {
            return self.first_of(&[
                category::IP_RESTRICTION,
                category::SECURITY,
                category::GENERAL,
            ]);
        }
        if lk.contains("sourcevpc") {
            return self.first_of(&[
                category::VPC_RESTRICTION,
                category::SECURITY,
                category::GENERAL,
            ]);
        }
        self.get(category::GENERAL).to_vec()
    }

    /// Evidence for a capability's service. S3 merges the list and get
    /// categories; other services use a category named after the service.
    pub fn for_service(&self, service: &str) -> Vec<Evidence> {
        if service == "s3" {
            let merged: Vec<Evidence> = self
                .get(category::S3_LIST)
                .iter()
                .chain(self.get(category::S3_GET))
                .cloned()
                .collect();
            if !merged.is_empty() {
                return merged;
            }
            return self.first_of(&[category::SECURITY, category::GENERAL]);
        }
        self.first_of(&[service, category::SECURITY, category::GENERAL])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Confidence;

    fn ev(url: &str) -> Evidence {
        Evidence::new(url, Confidence::new(90).unwrap(), "test")
    }

    #[test]
    fn s3_merges_list_and_get() {
        let mut index = EvidenceIndex::new();
        index.insert(category::S3_LIST, ev("list"));
        index.insert(category::S3_GET, ev("get"));
        index.insert(category::GENERAL, ev("general"));
        let urls: Vec<String> = index
            .for_service("s3")
            .into_iter()
            .map(|e| e.doc_url)
            .collect();
        assert_eq!(urls, vec!["list", "get"]);
    }

    #[test]
    fn service_falls_back_to_security_then_general() {
        let mut index = EvidenceIndex::new();
        index.insert(category::GENERAL, ev("general"));
        assert_eq!(index.for_service("kms")[0].doc_url, "general");
        index.insert(category::SECURITY, ev("security"));
        assert_eq!(index.for_service("kms")[0].doc_url, "security");
        index.insert("kms", ev("kms"));
        assert_eq!(index.for_service("kms")[0].doc_url, "kms");
    }

    #[test]
    fn condition_key_mapping() {
        let mut index = EvidenceIndex::new();
        index.insert(category::SECURE_TRANSPORT, ev("tls"));
        index.insert(category::GENERAL, ev("general"));
        assert_eq!(index.for_condition_key("aws:SecureTransport")[0].doc_url, "tls");
        assert_eq!(index.for_condition_key("aws:SourceVpce")[0].doc_url, "general");
        assert_eq!(index.for_condition_key("s3:prefix")[0].doc_url, "general");
    }

    #[test]
    fn empty_index_yields_nothing() {
        let index = EvidenceIndex::new();
        assert!(index.is_empty());
        assert!(index.for_service("s3").is_empty());
        assert!(index.for_condition_key("aws:SecureTransport").is_empty());
        assert!(!index.has(category::S3_LIST));
    }
}
