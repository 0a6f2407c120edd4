// readback.rs — Human-facing summary of extracted intent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What a reviewer reads before approving a policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadBack {
    /// 2–5 sentences.
    pub summary: String,
    /// 5–10 concise bullets.
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Unresolved placeholders and questions for the requester.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Things a reviewer should notice.
    #[serde(default)]
    pub risk_callouts: Vec<String>,
}

impl ReadBack {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// A copy whose assumptions and risk callouts are the union of the
    /// existing ones and the given findings, deduplicated and sorted.
    pub fn augmented<A, R>(&self, assumptions: A, risk_callouts: R) -> ReadBack
    where
        A: IntoIterator<Item = String>,
        R: IntoIterator<Item = String>,
    {
        ReadBack {
            summary: self.summary.clone(),
            bullets: self.bullets.clone(),
            assumptions: sorted_union(&self.assumptions, assumptions),
            risk_callouts: sorted_union(&self.risk_callouts, risk_callouts),
        }
    }
}

fn sorted_union(existing: &[String], extra: impl IntoIterator<Item = String>) -> Vec<String> {
    existing
        .iter()
        .cloned()
        .chain(extra)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_dedups_and_sorts_without_touching_original() {
        let mut rb = ReadBack::new("Read access to one bucket.");
        rb.assumptions = vec!["b".to_string(), "a".to_string()];
        let out = rb.augmented(
            vec!["a".to_string(), "c".to_string()],
            vec!["z".to_string(), "z".to_string()],
        );
        assert_eq!(out.assumptions, vec!["a", "b", "c"]);
        assert_eq!(out.risk_callouts, vec!["z"]);
        assert_eq!(rb.assumptions, vec!["b", "a"]);
        assert_eq!(out.summary, rb.summary);
    }
}
