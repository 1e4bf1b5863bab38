//! Axum serving layer.
//!
//! Thin boundary over the core engine: request alias normalization, error
//! payload shaping and response caching live here, never in the core
//! modules. Every endpoint answers with either a success payload or an
//! `{"error": message}` body; no handler can abort the process.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::Deserialize;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::advisory::{advise, AdvisoryRequest};
use crate::classifier::{ClassifierAdapter, CropModel};
use crate::data::SensorCorpus;
use crate::error::AdvisorError;
use crate::reference::ReferenceTable;
use crate::roi::calculate_roi;
use crate::suitability::score_conditions;
use crate::types::{round2, FieldConditions};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ClassifierAdapter>,
    pub reference: Arc<ReferenceTable>,
    pub sensor_corpus: Option<Arc<SensorCorpus>>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    /// Assemble state from already-built parts (tests use this directly).
    pub fn from_parts(
        classifier: ClassifierAdapter,
        reference: ReferenceTable,
        sensor_corpus: Option<SensorCorpus>,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300))
            .build();

        AppState {
            classifier: Arc::new(classifier),
            reference: Arc::new(reference),
            sensor_corpus: sensor_corpus.map(Arc::new),
            cache,
        }
    }

    /// Load state from configuration paths.
    ///
    /// The reference table falls back to the built-in crops when no path is
    /// given. The sensor corpus is optional; without it the input
    /// recommendation endpoint degrades to an error payload. No model
    /// loader ships with this crate, so the classifier starts unavailable
    /// unless one is attached via [`AppState::with_model`].
    pub fn load(reference_path: Option<&FsPath>, sensor_path: Option<&str>) -> anyhow::Result<Self> {
        let reference = match reference_path {
            Some(path) => {
                tracing::info!(?path, "loading reference table");
                ReferenceTable::load(path)?
            }
            None => ReferenceTable::builtin()?,
        };
        tracing::info!(crops = reference.len(), "reference table ready");

        let sensor_corpus = match sensor_path {
            Some(path) => Some(SensorCorpus::load(path)?),
            None => {
                tracing::warn!("no sensor dataset configured; input recommendations disabled");
                None
            }
        };

        Ok(Self::from_parts(
            ClassifierAdapter::unavailable(),
            reference,
            sensor_corpus,
        ))
    }

    /// Attach a trained model to the classifier adapter.
    pub fn with_model(mut self, model: Box<dyn CropModel>) -> Self {
        self.classifier = Arc::new(ClassifierAdapter::new(model));
        self
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Recommendation endpoints
        .route("/api/predict_crop", post(predict_crop))
        .route("/api/select_crop", post(select_crop))
        .route("/api/water_advisor", post(water_advisor))
        .route("/api/calculate_roi", post(roi))
        .route("/api/recommend_inputs/:crop", get(recommend_inputs))
        .route("/api/schemes", get(schemes))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Types (canonical schema + accepted aliases)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PredictBody {
    #[serde(rename = "N", alias = "n")]
    n: f64,
    #[serde(rename = "P", alias = "p")]
    p: f64,
    #[serde(rename = "K", alias = "k")]
    k: f64,
    #[serde(alias = "temp")]
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    #[serde(rename = "N", alias = "n", default)]
    n: f64,
    #[serde(rename = "P", alias = "p", default)]
    p: f64,
    #[serde(rename = "K", alias = "k", default)]
    k: f64,
    #[serde(default)]
    ph: f64,
    #[serde(default)]
    temperature: f64,
    /// mm/year
    #[serde(default)]
    rainfall: f64,
}

fn default_unknown() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Deserialize)]
struct WaterAdvisorBody {
    #[serde(rename = "Crop_Name")]
    crop_name: String,
    #[serde(rename = "Rainfall_Requirement", default)]
    rainfall: f64,
    #[serde(rename = "Temperature_Requirement", default)]
    temperature: f64,
    #[serde(rename = "Yield", default)]
    expected_yield: f64,
    #[serde(rename = "Crop_Cycle_Duration", default)]
    cycle_duration: u32,
    #[serde(rename = "Soil_Type", default = "default_unknown")]
    soil_type: String,
    #[serde(rename = "Irrigation_Type", default = "default_unknown")]
    irrigation_type: String,
    #[serde(rename = "Water_Scarcity", default = "default_unknown")]
    water_scarcity: String,
}

#[derive(Debug, Deserialize)]
struct RoiBody {
    crop: String,
    investment: f64,
    #[serde(alias = "expectedYield")]
    expected_yield: f64,
    #[serde(alias = "marketPrice")]
    market_price: f64,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Static directory of government support schemes; maintained by hand, so
/// it lives here rather than in a dataset.
async fn schemes() -> impl IntoResponse {
    Json(serde_json::json!({
        "schemes": [
            {
                "name": "PM-KISAN",
                "benefit": "₹6000/year income support",
                "link": "https://pmkisan.gov.in"
            },
            {
                "name": "PMFBY",
                "benefit": "Crop insurance for losses",
                "link": "https://pmfby.gov.in"
            },
            {
                "name": "Soil Health Card",
                "benefit": "Free soil testing & fertilizer advice",
                "link": "https://soilhealth.dac.gov.in"
            },
            {
                "name": "eNAM",
                "benefit": "Online crop marketplace for better prices",
                "link": "https://enam.gov.in"
            },
            {
                "name": "KCC Loan",
                "benefit": "Low interest credit for farmers",
                "link": "https://www.myscheme.gov.in/schemes/kcc"
            }
        ]
    }))
}

async fn predict_crop(
    State(state): State<AppState>,
    Json(body): Json<PredictBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let conditions = FieldConditions {
        n: body.n,
        p: body.p,
        k: body.k,
        temperature: body.temperature,
        humidity: body.humidity,
        ph: body.ph,
        rainfall: body.rainfall,
    };

    let result = state.classifier.predict_top3(&conditions)?;

    // Probabilities go out as percentages, matching the display contract.
    let top: Vec<serde_json::Value> = result
        .top_predictions
        .iter()
        .map(|p| {
            serde_json::json!({
                "crop": p.crop,
                "probability": round2(p.probability * 100.0),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "predicted_crop": result.predicted_crop,
        "top_3_predictions": top,
    })))
}

async fn select_crop(
    State(state): State<AppState>,
    Json(body): Json<SelectBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let conditions = FieldConditions {
        n: body.n,
        p: body.p,
        k: body.k,
        temperature: body.temperature,
        humidity: 0.0, // not a scoring input
        ph: body.ph,
        rainfall: body.rainfall,
    };

    let shortlist = score_conditions(&state.reference, &conditions);

    // An empty shortlist is a valid answer, not an error.
    Ok(Json(serde_json::json!({
        "recommended_crops": shortlist,
    })))
}

async fn water_advisor(
    State(state): State<AppState>,
    Json(body): Json<WaterAdvisorBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = AdvisoryRequest {
        crop_name: body.crop_name,
        temperature: body.temperature,
        rainfall: body.rainfall,
        expected_yield: body.expected_yield,
        cycle_duration_days: body.cycle_duration,
        soil_type: body.soil_type,
        irrigation_type: body.irrigation_type,
        water_scarcity: body.water_scarcity,
    };

    let result = advise(&state.reference, &request)?;

    Ok(Json(serde_json::json!({
        "crop": result.crop,
        "soil_type": result.soil_type,
        "irrigation_type": result.irrigation_type,
        "water_scarcity": result.water_scarcity,
        "predicted_water_use": result.predicted_water_use,
        "predicted_temperature_requirement": result.predicted_temperature_requirement,
        "predicted_rainfall_requirement": result.predicted_rainfall_requirement,
        "cycle_duration_days": result.cycle_duration_days,
        "yield_estimate": result.yield_estimate,
        "advice": result.advice_text(),
    })))
}

async fn roi(
    State(_state): State<AppState>,
    Json(body): Json<RoiBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = calculate_roi(
        &body.crop,
        body.investment,
        body.expected_yield,
        body.market_price,
    )?;

    Ok(Json(serde_json::to_value(&result).map_err(|e| {
        AppError::Internal(format!("serialization failed: {}", e))
    })?))
}

async fn recommend_inputs(
    State(state): State<AppState>,
    Path(crop): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let corpus = state
        .sensor_corpus
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("sensor dataset not loaded".to_string()))?;

    let cache_key = format!("inputs:{}", crop.trim().to_lowercase());
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!(crop = %crop, "cache hit for recommended inputs");
        return Ok(Json(cached));
    }

    let inputs = corpus.recommended_inputs(&crop)?;
    let result = serde_json::json!({
        "crop": crop.trim().to_lowercase(),
        "recommended_inputs": {
            "N": inputs.n,
            "P": inputs.p,
            "K": inputs.k,
            "temperature": inputs.temperature,
            "humidity": inputs.humidity,
            "ph": inputs.ph,
            "rainfall": inputs.rainfall,
        }
    });

    state.cache.insert(cache_key, result.clone()).await;
    Ok(Json(result))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Advisor(AdvisorError),
    Unavailable(String),
    Internal(String),
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        AppError::Advisor(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Advisor(err) => {
                let status = match err {
                    AdvisorError::Validation { .. } | AdvisorError::InvalidInvestment(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    AdvisorError::UnknownCrop(_) => StatusCode::NOT_FOUND,
                    AdvisorError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    AdvisorError::Model(_)
                    | AdvisorError::Reconciliation(_)
                    | AdvisorError::Corpus(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
