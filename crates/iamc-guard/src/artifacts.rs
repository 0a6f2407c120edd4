// artifacts.rs — The terminal bundle of one compilation session.
//
// A session produces four artifacts: the audited read-back, the spec, the
// deterministic baseline and the externally generated candidate. The bundle
// computes the analysis a persistence sink renders; it never writes files.

use std::collections::BTreeSet;

use iamc_spec::{BaselinePolicy, CandidatePolicy, Evidence, ReadBack, SpecDsl};
use serde::Serialize;
use uuid::Uuid;

use crate::comparator::{compare, complexity, AlignmentReport};
use crate::error::ArtifactError;

#[derive(Debug, Clone, Serialize)]
pub struct PolicyArtifacts {
    pub session_id: Uuid,
    pub read_back: ReadBack,
    pub spec: SpecDsl,
    pub baseline: BaselinePolicy,
    pub candidate: CandidatePolicy,
    /// How sure the extractor was about the intent, 0.0..=1.0.
    pub extraction_confidence: f64,
    /// How sure the generator was about the candidate, 0.0..=1.0.
    pub generation_confidence: f64,
}

/// Summary numbers for reports and audit trails.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtifactAnalysis {
    pub comparison: AlignmentReport,
    /// Capability and condition evidence; denial evidence is not counted.
    pub evidence_count: usize,
    pub capability_count: usize,
    pub restriction_count: usize,
    /// Distinct evidence URLs, sorted.
    pub evidence_sources: Vec<String>,
    pub baseline_complexity: u32,
    pub candidate_complexity: u32,
    pub baseline_digest: String,
    pub candidate_digest: String,
}

impl PolicyArtifacts {
    /// Bundle one session under a fresh session id.
    pub fn new(
        read_back: ReadBack,
        spec: SpecDsl,
        baseline: BaselinePolicy,
        candidate: CandidatePolicy,
        extraction_confidence: f64,
        generation_confidence: f64,
    ) -> Result<Self, ArtifactError> {
        check_unit("extraction_confidence", extraction_confidence)?;
        check_unit("generation_confidence", generation_confidence)?;
        let session_id = Uuid::new_v4();
        tracing::info!(%session_id, "assembled policy artifacts");
        Ok(Self {
            session_id,
            read_back,
            spec,
            baseline,
            candidate,
            extraction_confidence,
            generation_confidence,
        })
    }

    pub fn analysis(&self) -> Result<ArtifactAnalysis, ArtifactError> {
        let baseline = self.baseline.document();
        let evidence = self.evidence();
        let evidence_sources: BTreeSet<&str> =
            evidence.iter().map(|e| e.doc_url.as_str()).collect();

        Ok(ArtifactAnalysis {
            comparison: compare(baseline, &self.candidate),
            evidence_count: evidence.len(),
            capability_count: self.spec.capabilities.len(),
            restriction_count: self.spec.must_never.len(),
            evidence_sources: evidence_sources.into_iter().map(str::to_string).collect(),
            baseline_complexity: complexity(baseline),
            candidate_complexity: complexity(&self.candidate),
            baseline_digest: baseline.digest()?,
            candidate_digest: self.candidate.digest()?,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn evidence(&self) -> Vec<&Evidence> {
        self.spec
            .capabilities
            .iter()
            .flat_map(|c| {
                c.evidence
                    .iter()
                    .chain(c.conditions.iter().flat_map(|cond| cond.evidence.iter()))
            })
            .collect()
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ArtifactError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ArtifactError::InvalidConfidence { field, value })
    }
}
