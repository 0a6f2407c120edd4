// error.rs — Errors from adapting untyped intent.

use iamc_spec::Violation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptError {
    /// Raw entries were too malformed to shape into the DSL. Defaults cover
    /// absent fields; these are the cases no default can fix.
    #[error("untyped intent could not be adapted: {}", render(.0))]
    Schema(Vec<Violation>),

    #[error("failed to parse untyped intent JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdaptError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            AdaptError::Schema(violations) => violations,
            AdaptError::Json(_) => &[],
        }
    }
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
