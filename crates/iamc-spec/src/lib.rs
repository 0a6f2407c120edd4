//! # iamc-spec
//!
//! Spec DSL, validator and canonizer for the IAM policy intent compiler.
//!
//! A [`SpecDsl`] is the typed, evidence-carrying description of the access a
//! principal needs. The [`DslValidator`] reports every invariant violation as
//! a structured [`Violation`]; the [`Canonizer`] turns a valid spec into a
//! deterministic [`BaselinePolicy`].
//!
//! ## Key invariants
//!
//! - **Fail closed**: [`validate_and_canonize`] never returns a baseline for
//!   a spec with violations.
//! - **Deterministic**: the same spec always yields byte-identical JSON.
//! - **Explicit resources**: no capability may grant only `"*"`.
//! - **Evidence floor**: every capability cites evidence at or above the
//!   configured confidence (80 by default).
//! - **Denies last**: must-never entries compile to Deny statements after
//!   every Allow.

pub mod canonizer;
pub mod config;
pub mod document;
pub mod dsl;
pub mod error;
pub mod evidence;
pub mod evidence_index;
pub mod hasher;
pub mod patterns;
pub mod readback;
pub mod registry;
pub mod validator;
pub mod violation;

pub use canonizer::{canonize, validate_and_canonize, validate_and_canonize_with, Canonizer};
pub use config::{AdapterConfig, CoreConfig, GuardrailConfig, ValidatorConfig};
pub use document::{
    BaselinePolicy, CandidatePolicy, ConditionBlock, Effect, PolicyDocument, Statement,
    POLICY_VERSION,
};
pub use dsl::{
    ActionSelector, Capability, CapabilityMode, Condition, ConditionOp, ConditionValue,
    MustNever, Principal, Scope, SpecDsl, DSL_VERSION, PRINCIPAL_PLACEHOLDER,
};
pub use error::{CanonizeError, ConfidenceOutOfRange, ConfigError, PolicyError};
pub use evidence::{Confidence, Evidence};
pub use evidence_index::EvidenceIndex;
pub use readback::ReadBack;
pub use registry::{ServiceDefinition, ServiceRegistry};
pub use validator::{is_valid, validate, DslValidator, DEFAULT_MIN_CONFIDENCE};
pub use violation::{Rule, Violation, ViolationKind};
