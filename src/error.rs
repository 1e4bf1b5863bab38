//! Error taxonomy for the recommendation engine.
//!
//! Every public operation returns one of these variants instead of letting a
//! failure escape its contract. The serving layer turns them into
//! `{"error": message}` payloads; nothing here aborts the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    /// A required request field is missing or not numeric.
    #[error("invalid value for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// No trained classifier was loaded at startup.
    #[error("crop prediction model is not loaded")]
    ModelUnavailable,

    /// The external model call failed or returned an inconsistent
    /// distribution (label/probability length mismatch, empty output).
    #[error("model prediction failed: {0}")]
    Model(String),

    /// The crop label has no entry in the reference table.
    #[error("no reference data found for crop '{0}'")]
    UnknownCrop(String),

    /// ROI needs a strictly positive investment; dividing by zero (or a
    /// negative stake) would produce infinite or nonsensical returns.
    #[error("investment must be positive, got {0}")]
    InvalidInvestment(f64),

    /// The reconciliation pipeline could not produce a corpus.
    #[error("reconciliation failed: {0}")]
    Reconciliation(String),

    /// A query against the loaded sensor corpus failed.
    #[error("corpus query failed: {0}")]
    Corpus(String),
}

impl AdvisorError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AdvisorError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
