// evidence.rs — Citations that justify a capability, condition or denial.
//
// Evidence is created either from a retrieved documentation snippet or
// synthesized by a guardrail default. It is never edited afterwards; the
// builder methods consume and return `Self`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfidenceOutOfRange;
use crate::hasher;

/// Longest excerpt kept on a piece of evidence, in characters.
pub const MAX_QUOTE_CHARS: usize = 200;

/// Confidence score in 0..=100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u32", into = "u32")]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Result<Self, ConfidenceOutOfRange> {
        Self::try_from(u32::from(value))
    }

    /// Clamp `value` to [`Confidence::MAX`].
    pub fn saturating(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    /// Convert a retrieval score in 0.0..=1.0 to a confidence, truncating
    /// like an integer cast and clamping out-of-range scores.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() || score <= 0.0 {
            return Self(0);
        }
        let pct = (score * 100.0).trunc();
        if pct >= f64::from(Self::MAX) {
            Self(Self::MAX)
        } else {
            Self(pct as u8)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Confidence {
    type Error = ConfidenceOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > u32::from(Self::MAX) {
            return Err(ConfidenceOutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Confidence> for u32 {
    fn from(c: Confidence) -> Self {
        u32::from(c.0)
    }
}

/// One documentation citation backing a single mapping decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    /// Canonical URL (section anchor if possible).
    pub doc_url: String,
    pub confidence: Confidence,
    /// One line, e.g. "ListBucket needed to enumerate objects".
    pub rationale: String,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// SHA-256 of the full excerpt the quote was cut from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl Evidence {
    /// Create evidence stamped with the current time.
    pub fn new(
        doc_url: impl Into<String>,
        confidence: Confidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            doc_url: doc_url.into(),
            confidence,
            rationale: rationale.into(),
            retrieved_at: Utc::now(),
            quote: None,
            content_hash: None,
        }
    }

    pub fn retrieved_at(mut self, at: DateTime<Utc>) -> Self {
        self.retrieved_at = at;
        self
    }

    /// Attach an excerpt. The quote is cut to [`MAX_QUOTE_CHARS`] and the
    /// hash covers the full text.
    pub fn with_quote(mut self, text: &str) -> Self {
        self.quote = Some(text.chars().take(MAX_QUOTE_CHARS).collect());
        self.content_hash = Some(hasher::hash_str(text));
        self
    }
}

/// Lowest confidence across a set of evidence, or `None` when it is empty.
pub fn min_confidence(evidence: &[Evidence]) -> Option<u8> {
    evidence.iter().map(|e| e.confidence.value()).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rejects_out_of_range() {
        assert!(Confidence::new(100).is_ok());
        assert_eq!(Confidence::new(101), Err(ConfidenceOutOfRange(101)));
        let parsed: Result<Confidence, _> = serde_json::from_str("250");
        assert!(parsed.is_err());
    }

    #[test]
    fn confidence_from_score_truncates_and_clamps() {
        assert_eq!(Confidence::from_score(0.876).value(), 87);
        assert_eq!(Confidence::from_score(1.7).value(), 100);
        assert_eq!(Confidence::from_score(-0.2).value(), 0);
        assert_eq!(Confidence::from_score(f64::NAN).value(), 0);
    }

    #[test]
    fn quote_is_truncated_and_hashed() {
        let long = "x".repeat(500);
        let ev =
            Evidence::new("https://docs", Confidence::new(90).unwrap(), "r").with_quote(&long);
        assert_eq!(ev.quote.as_ref().unwrap().chars().count(), MAX_QUOTE_CHARS);
        assert_eq!(
            ev.content_hash.as_deref(),
            Some(hasher::hash_str(&long).as_str())
        );
    }

    #[test]
    fn min_confidence_of_empty_is_none() {
        assert_eq!(min_confidence(&[]), None);
        let a = Evidence::new("a", Confidence::new(95).unwrap(), "a");
        let b = Evidence::new("b", Confidence::new(70).unwrap(), "b");
        assert_eq!(min_confidence(&[a, b]), Some(70));
    }

    #[test]
    fn evidence_wire_shape_omits_empty_optionals() {
        let ev = Evidence::new("https://docs", Confidence::new(99).unwrap(), "HTTPS");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["confidence"], 99);
        assert!(json.get("quote").is_none());
        assert!(json.get("content_hash").is_none());
    }
}
