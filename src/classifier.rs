//! Classifier adapter.
//!
//! The trained crop model is an external collaborator reached through the
//! [`CropModel`] trait; the adapter's whole job is feature assembly,
//! invocation, sorting the returned distribution and truncating it to the
//! top three. Training and model persistence live elsewhere.

use crate::error::AdvisorError;
use crate::types::{FieldConditions, Prediction, PredictionResult};

/// Number of features the model was trained on:
/// N, P, K, temperature, ph, rainfall (scaled).
pub const FEATURE_COUNT: usize = 6;

/// How many predictions survive truncation.
pub const TOP_K: usize = 3;

/// Fixed prediction interface to the trained classifier.
///
/// Implementations return `(labels, probabilities)` of equal length,
/// order-matched, with probabilities summing to 1.
pub trait CropModel: Send + Sync {
    fn predict_probabilities(
        &self,
        features: &[f64; FEATURE_COUNT],
    ) -> anyhow::Result<(Vec<String>, Vec<f64>)>;
}

/// Wraps whatever model was loaded at startup; `None` means every
/// prediction degrades to a [`AdvisorError::ModelUnavailable`] result
/// instead of crashing the serving path.
pub struct ClassifierAdapter {
    model: Option<Box<dyn CropModel>>,
}

impl ClassifierAdapter {
    pub fn new(model: Box<dyn CropModel>) -> Self {
        ClassifierAdapter { model: Some(model) }
    }

    /// Adapter with no model behind it.
    pub fn unavailable() -> Self {
        ClassifierAdapter { model: None }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Top-3 prediction for the given field conditions.
    ///
    /// Probability ties keep the model's native class order (the sort is
    /// stable); the distribution is validated before truncation.
    pub fn predict_top3(
        &self,
        conditions: &FieldConditions,
    ) -> Result<PredictionResult, AdvisorError> {
        let model = self
            .model
            .as_deref()
            .ok_or(AdvisorError::ModelUnavailable)?;

        let features = conditions.to_feature_vector();
        let (labels, probabilities) = model
            .predict_probabilities(&features)
            .map_err(|e| AdvisorError::Model(e.to_string()))?;

        if labels.len() != probabilities.len() {
            return Err(AdvisorError::Model(format!(
                "model returned {} labels but {} probabilities",
                labels.len(),
                probabilities.len()
            )));
        }
        if labels.is_empty() {
            return Err(AdvisorError::Model(
                "model returned an empty distribution".to_string(),
            ));
        }

        let mut ranked: Vec<Prediction> = labels
            .into_iter()
            .zip(probabilities)
            .map(|(crop, probability)| Prediction { crop, probability })
            .collect();

        ranked.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(TOP_K);

        let predicted_crop = ranked
            .first()
            .map(|p| p.crop.clone())
            .ok_or_else(|| AdvisorError::Model("empty ranking".to_string()))?;

        Ok(PredictionResult {
            predicted_crop,
            top_predictions: ranked,
        })
    }
}
