//! Core value objects shared across the engine.
//!
//! Everything here is created fresh per request and dropped with the
//! response; the only long-lived state in the crate is the reference table
//! and whatever model the adapter wraps, both read-only after startup.

use serde::{Deserialize, Serialize};

/// Scale factor between request rainfall (mm/year) and the unit the
/// classifier was trained on.
pub const RAINFALL_SCALE: f64 = 100.0;

/// Field conditions supplied with a prediction or selection request.
///
/// Rainfall arrives in mm/year; [`FieldConditions::to_feature_vector`]
/// applies the division the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldConditions {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl FieldConditions {
    /// Feature vector in the classifier's fixed order:
    /// `[N, P, K, temperature, ph, rainfall / 100]`.
    ///
    /// Humidity is deliberately not a model feature.
    pub fn to_feature_vector(&self) -> [f64; 6] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.ph,
            self.rainfall / RAINFALL_SCALE,
        ]
    }
}

/// One (crop, probability) pair from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub crop: String,
    /// Raw probability in [0, 1]. Percent formatting happens at the
    /// serving boundary, not here.
    pub probability: f64,
}

/// Classifier output truncated to the top entries, descending probability.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub predicted_crop: String,
    pub top_predictions: Vec<Prediction>,
}

/// Per-crop mean input levels computed from the sensor corpus.
///
/// Rainfall is echoed back in mm/year (multiplied back up from the model
/// unit), everything else in the unit it was recorded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedInputs {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

/// Round to two decimal places, matching the precision every response
/// surface uses for derived numbers.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
