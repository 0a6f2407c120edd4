// error.rs — Error types for assembling compilation artifacts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A confidence scalar outside 0.0..=1.0 (or NaN).
    #[error("{field} must be within 0.0..=1.0, got {value}")]
    InvalidConfidence { field: &'static str, value: f64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
