//! Agronomic Recommendation Engine
//!
//! Reconciles three schema-divergent agricultural datasets into one training
//! corpus and turns sensor-like field conditions plus a trained classifier's
//! probabilities into ranked, human-actionable recommendations:
//!
//! - `data`: Polars-based schema normalization and record reconciliation
//! - `reference`: static per-crop agronomic envelopes (JSON-configured)
//! - `classifier`: adapter around the external trained crop model
//! - `suitability`: rule-based crop shortlisting
//! - `advisory`: water advisory evaluation
//! - `roi`: return-on-investment arithmetic
//!
//! Everything is synchronous and stateless per request; the reference table
//! and the wrapped model are the only shared resources and both are
//! read-only after startup. The `api` feature adds an Axum serving layer on
//! top; the core never depends on it.

pub mod advisory;
pub mod classifier;
pub mod data;
pub mod error;
pub mod reference;
pub mod roi;
pub mod suitability;
pub mod types;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use advisory::{advise, AdvisoryRequest, AdvisoryResult};
pub use classifier::{ClassifierAdapter, CropModel};
pub use data::{CropRecord, ReconciledCorpus, SensorCorpus};
pub use error::AdvisorError;
pub use reference::{Range, ReferenceCropProfile, ReferenceTable};
pub use roi::{calculate_roi, RoiResult};
pub use suitability::score_conditions;
pub use types::{FieldConditions, Prediction, PredictionResult, RecommendedInputs};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
