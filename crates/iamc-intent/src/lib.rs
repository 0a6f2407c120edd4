//! # iamc-intent
//!
//! Boundary between untrusted extraction output and the typed spec DSL.
//!
//! - [`UntypedIntent`] mirrors the loosely-structured JSON an extractor
//!   produces; every field may be absent.
//! - [`from_snippets`] scans retrieved documentation into an
//!   [`EvidenceIndex`](iamc_spec::EvidenceIndex).
//! - [`IntentAdapter`] shapes raw intent into a [`SpecDsl`](iamc_spec::SpecDsl),
//!   filling conservative defaults and attaching evidence.
//! - [`draft_read_back`] writes the first human-facing summary.

pub mod adapter;
pub mod error;
pub mod raw;
pub mod readback;
pub mod snippets;

pub use adapter::IntentAdapter;
pub use error::AdaptError;
pub use raw::{RawCapability, RawCondition, RawMustNever, UntypedIntent};
pub use readback::draft_read_back;
pub use snippets::{from_snippets, Snippet};
