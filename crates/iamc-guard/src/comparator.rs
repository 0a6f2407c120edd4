// comparator.rs — Baseline vs candidate policy alignment metrics.

use std::collections::BTreeSet;

use iamc_spec::PolicyDocument;
use serde::{Deserialize, Serialize};

pub const ACTIONS_WEIGHT: f64 = 0.4;
pub const RESOURCES_WEIGHT: f64 = 0.3;
pub const STRUCTURE_WEIGHT: f64 = 0.3;

/// Overlap between two policies. Set fields are sorted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentReport {
    pub baseline_statement_count: usize,
    pub candidate_statement_count: usize,
    pub statement_difference: usize,
    pub baseline_only_actions: Vec<String>,
    pub candidate_only_actions: Vec<String>,
    pub common_actions: Vec<String>,
    pub baseline_only_resources: Vec<String>,
    pub candidate_only_resources: Vec<String>,
    pub common_resources: Vec<String>,
    /// |common| / |union|, 1.0 when both are empty.
    pub actions_overlap: f64,
    pub resources_overlap: f64,
    pub structure_score: f64,
    /// 0.4·actions + 0.3·resources + 0.3·structure, rounded to 3 places.
    pub alignment_score: f64,
}

impl AlignmentReport {
    /// Review hints for a human comparing the two policies.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.statement_difference > 2 {
            out.push("Significant structural differences - review carefully".to_string());
        }
        if self.actions_overlap < 0.8 {
            out.push("Low action overlap - verify intent alignment".to_string());
        }
        if self.candidate_statement_count == 0 {
            out.push("Candidate policy is empty - baseline recommended".to_string());
        }
        if self.baseline_statement_count == 0 {
            out.push("Baseline policy is empty - review SpecDSL".to_string());
        }
        out
    }
}

/// Compare a baseline policy against a candidate.
pub fn compare(baseline: &PolicyDocument, candidate: &PolicyDocument) -> AlignmentReport {
    let b_actions = collect(baseline, |s| &s.action);
    let c_actions = collect(candidate, |s| &s.action);
    let b_resources = collect(baseline, |s| &s.resource);
    let c_resources = collect(candidate, |s| &s.resource);

    let b_count = baseline.statements().len();
    let c_count = candidate.statements().len();
    let statement_difference = b_count.abs_diff(c_count);

    let actions_overlap = overlap(&b_actions, &c_actions);
    let resources_overlap = overlap(&b_resources, &c_resources);
    let structure_score = if b_count + c_count == 0 {
        1.0
    } else {
        1.0 - statement_difference as f64 / (b_count + c_count) as f64
    };
    let alignment_score = round3(
        (ACTIONS_WEIGHT * actions_overlap
            + RESOURCES_WEIGHT * resources_overlap
            + STRUCTURE_WEIGHT * structure_score)
            .clamp(0.0, 1.0),
    );

    tracing::debug!(
        baseline_statements = b_count,
        candidate_statements = c_count,
        alignment_score,
        "compared policies"
    );

    AlignmentReport {
        baseline_statement_count: b_count,
        candidate_statement_count: c_count,
        statement_difference,
        baseline_only_actions: sorted(b_actions.difference(&c_actions)),
        candidate_only_actions: sorted(c_actions.difference(&b_actions)),
        common_actions: sorted(b_actions.intersection(&c_actions)),
        baseline_only_resources: sorted(b_resources.difference(&c_resources)),
        candidate_only_resources: sorted(c_resources.difference(&b_resources)),
        common_resources: sorted(b_resources.intersection(&c_resources)),
        actions_overlap,
        resources_overlap,
        structure_score,
        alignment_score,
    }
}

/// 1 per statement, 0.1 per action and resource, 0.5 per condition
/// operator; truncated.
pub fn complexity(policy: &PolicyDocument) -> u32 {
    let score: f64 = policy
        .statements()
        .iter()
        .map(|s| {
            1.0 + 0.1 * s.action.len() as f64
                + 0.1 * s.resource.len() as f64
                + 0.5 * s.condition.as_ref().map_or(0, |c| c.len()) as f64
        })
        .sum();
    score as u32
}

fn collect<'a, F>(policy: &'a PolicyDocument, field: F) -> BTreeSet<&'a str>
where
    F: Fn(&'a iamc_spec::Statement) -> &'a Vec<String>,
{
    policy
        .statements()
        .iter()
        .flat_map(|s| field(s).iter().map(String::as_str))
        .collect()
}

fn overlap(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn sorted<'a, 'b: 'a>(items: impl Iterator<Item = &'a &'b str>) -> Vec<String> {
    items.map(|s| s.to_string()).collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use iamc_spec::{Effect, Statement};

    fn stmt(effect: Effect, actions: &[&str], resources: &[&str]) -> Statement {
        Statement {
            sid: String::new(),
            effect,
            action: actions.iter().map(|s| s.to_string()).collect(),
            resource: resources.iter().map(|s| s.to_string()).collect(),
            condition: None,
        }
    }

    fn baseline() -> PolicyDocument {
        PolicyDocument::new(vec![
            stmt(Effect::Allow, &["s3:ListBucket"], &["arn:aws:s3:::b"]),
            stmt(Effect::Allow, &["s3:GetObject"], &["arn:aws:s3:::b/*"]),
            stmt(
                Effect::Deny,
                &["s3:PutObject", "s3:DeleteObject"],
                &["arn:aws:s3:::b", "arn:aws:s3:::b/*"],
            ),
        ])
    }

    #[test]
    fn self_comparison_is_perfect() {
        let p = baseline();
        let report = compare(&p, &p);
        assert_eq!(report.actions_overlap, 1.0);
        assert_eq!(report.resources_overlap, 1.0);
        assert_eq!(report.structure_score, 1.0);
        assert_eq!(report.alignment_score, 1.0);
        assert!(report.baseline_only_actions.is_empty());
        assert!(report.recommendations().is_empty());
    }

    #[test]
    fn empty_policies_align() {
        let empty = PolicyDocument::new(vec![]);
        let report = compare(&empty, &empty);
        assert_eq!(report.alignment_score, 1.0);
        assert_eq!(report.recommendations().len(), 2);
    }

    #[test]
    fn partial_overlap() {
        let candidate = PolicyDocument::new(vec![stmt(
            Effect::Allow,
            &["s3:ListBucket", "s3:GetObject", "s3:PutObject"],
            &["arn:aws:s3:::b", "arn:aws:s3:::b/*"],
        )]);
        let report = compare(&baseline(), &candidate);
        // actions: common 3 of union 4; resources identical; structure 1 - 2/4
        assert_eq!(report.actions_overlap, 0.75);
        assert_eq!(report.resources_overlap, 1.0);
        assert_eq!(report.structure_score, 0.5);
        assert_eq!(report.alignment_score, 0.75);
        assert_eq!(report.statement_difference, 2);
        assert_eq!(report.baseline_only_actions, vec!["s3:DeleteObject"]);
        assert!(report.candidate_only_actions.is_empty());
        assert_eq!(
            report.recommendations(),
            vec!["Low action overlap - verify intent alignment"]
        );
    }

    #[test]
    fn disjoint_policies_score_low() {
        let candidate = PolicyDocument::new(vec![stmt(Effect::Allow, &["kms:Decrypt"], &["k"])]);
        let report = compare(&baseline(), &candidate);
        assert_eq!(report.actions_overlap, 0.0);
        assert_eq!(report.resources_overlap, 0.0);
        assert_eq!(report.alignment_score, 0.15);
        assert!((0.0..=1.0).contains(&report.alignment_score));
    }

    #[test]
    fn complexity_counts_parts() {
        // 3 statements + 0.1 × (1+1+1+1+2+2) = 3.8
        assert_eq!(complexity(&baseline()), 3);
        let mut with_conditions = baseline();
        let mut block = iamc_spec::ConditionBlock::new();
        block.entry("Bool".to_string()).or_default().insert(
            "aws:SecureTransport".to_string(),
            serde_json::Value::String("true".to_string()),
        );
        block.entry("IpAddress".to_string()).or_default().insert(
            "aws:SourceIp".to_string(),
            serde_json::Value::String("10.0.0.0/8".to_string()),
        );
        with_conditions.statement[0].condition = Some(block);
        assert_eq!(complexity(&with_conditions), 4);
    }
}
