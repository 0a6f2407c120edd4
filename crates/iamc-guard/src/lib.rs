//! # iamc-guard
//!
//! Review layer of the IAM policy intent compiler.
//!
//! - [`GuardrailAuditor`] cross-checks a spec and its evidence against
//!   security and completeness rules and returns an augmented
//!   [`ReadBack`](iamc_spec::ReadBack). It never fails.
//! - [`compare`] measures how closely a candidate policy matches the
//!   deterministic baseline.
//! - [`PolicyArtifacts`] bundles one compilation session for a persistence
//!   sink, with [`ArtifactAnalysis`] as its summary.

pub mod artifacts;
pub mod comparator;
pub mod error;
pub mod guardrail;

pub use artifacts::{ArtifactAnalysis, PolicyArtifacts};
pub use comparator::{compare, complexity, AlignmentReport};
pub use error::ArtifactError;
pub use guardrail::{audit, GuardrailAuditor};
