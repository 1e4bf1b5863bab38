//! Dataset normalization and reconciliation.
//!
//! Three independently collected datasets feed the training corpus: the
//! rainfall/soil-chemistry readings, the regional yield table, and the
//! soil-type survey. Each arrives with its own column vocabulary; this
//! module renames everything onto a shared schema, joins the three sources,
//! and resolves the duplicate pH columns with an explicit priority merge.
//!
//! The crop label is the join key and is trimmed + lowercased identically in
//! every source; without that, joins silently drop rows.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use crate::error::AdvisorError;
use crate::types::{round2, RecommendedInputs, RAINFALL_SCALE};

/// One reconciled corpus row.
///
/// Optional fields stay missing when a source had no value for them; the
/// reconciler never invents numeric defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRecord {
    pub crop_label: String,
    pub year: i32,
    pub season: Option<String>,
    pub state: Option<String>,
    pub area: Option<f64>,
    pub production: Option<f64>,
    #[serde(rename = "yield")]
    pub crop_yield: Option<f64>,
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub soil_type: Option<String>,
}

/// Output of a reconciliation run: the joined frame plus how many soil rows
/// were dropped for unparsable dates.
#[derive(Debug)]
pub struct ReconciledCorpus {
    pub frame: DataFrame,
    pub skipped_soil_rows: usize,
}

impl ReconciledCorpus {
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Materialize the frame into typed records.
    pub fn records(&self) -> Result<Vec<CropRecord>> {
        extract_records(&self.frame)
    }
}

/// Trim surrounding whitespace and lowercase a label expression. Applied to
/// the crop column of every source before any join.
fn normalize_crop_label(expr: Expr) -> Expr {
    expr.str().strip_chars(lit(Null {})).str().to_lowercase()
}

/// Load a raw CSV with full schema inference.
pub fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None) // Scan entire file
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("failed to open CSV: {}", path))?
        .finish()
        .with_context(|| format!("failed to read CSV: {}", path))
}

/// Normalize the rainfall/soil-chemistry dataset.
///
/// Keeps the sensor columns under canonical names. This source has no year
/// axis; its readings are treated as per-crop baselines.
pub fn normalize_rainfall(df: DataFrame) -> Result<DataFrame> {
    df.lazy()
        .select([
            normalize_crop_label(col("label")).alias("crop_label"),
            col("N").cast(DataType::Float64),
            col("P").cast(DataType::Float64),
            col("K").cast(DataType::Float64),
            col("temperature").cast(DataType::Float64),
            col("humidity").cast(DataType::Float64),
            col("ph").cast(DataType::Float64),
        ])
        .collect()
        .with_context(|| "failed to normalize rainfall dataset")
}

/// Normalize the regional yield dataset: `Crop_Year → year`, `Crop →
/// crop_label`, production columns kept under lowercase names.
///
/// Rows without a crop or year cannot participate in any join and are
/// dropped here rather than surfacing as null join keys.
pub fn normalize_region(df: DataFrame) -> Result<DataFrame> {
    df.lazy()
        .select([
            normalize_crop_label(col("Crop")).alias("crop_label"),
            col("Crop_Year").cast(DataType::Int32).alias("year"),
            col("Season").alias("season"),
            col("State").alias("state"),
            col("Area").cast(DataType::Float64).alias("area"),
            col("Production").cast(DataType::Float64).alias("production"),
            col("Yield").cast(DataType::Float64).alias("yield"),
        ])
        .filter(col("crop_label").is_not_null().and(col("year").is_not_null()))
        .collect()
        .with_context(|| "failed to normalize region dataset")
}

/// Normalize the soil-type dataset: `Crop_Type → crop_label`, `Soil_pH →
/// ph`, `Temperature`/`Humidity` lowercased, and `year` derived from the
/// calendar year of the `Date` column (which is then dropped).
///
/// Rows whose date cannot be parsed are skipped, never zero-filled; the
/// skip count is returned alongside the frame and logged by the caller.
pub fn normalize_soil(df: DataFrame) -> Result<(DataFrame, usize)> {
    let with_year = df
        .lazy()
        .with_column(
            col("Date")
                .str()
                .to_date(StrptimeOptions {
                    strict: false, // Unparsable dates become null, counted below
                    ..Default::default()
                })
                .dt()
                .year()
                .alias("year"),
        )
        .collect()
        .with_context(|| "failed to derive year from soil dates")?;

    let skipped = with_year
        .column("year")
        .with_context(|| "year column missing after date parse")?
        .null_count();

    let normalized = with_year
        .lazy()
        .filter(col("year").is_not_null())
        .select([
            normalize_crop_label(col("Crop_Type")).alias("crop_label"),
            col("year").cast(DataType::Int32),
            col("Soil_Type").alias("soil_type"),
            col("Soil_pH").cast(DataType::Float64).alias("ph"),
            col("Temperature").cast(DataType::Float64).alias("temperature"),
            col("Humidity").cast(DataType::Float64).alias("humidity"),
        ])
        .collect()
        .with_context(|| "failed to normalize soil dataset")?;

    Ok((normalized, skipped))
}

/// Join the three normalized datasets into one corpus frame.
///
/// The rainfall chemistry is a per-crop baseline with no year axis, so the
/// first join keys on `crop_label` alone; the soil survey joins on
/// `(crop_label, year)`. Both joins are left-outer from the region table.
/// The two pH sources are merged explicitly: the rainfall value wins when
/// present, the soil value is the fallback, and a row with neither keeps a
/// missing pH. Output row order is not guaranteed to match input order.
pub fn reconcile(rainfall: DataFrame, region: DataFrame, soil: DataFrame) -> Result<DataFrame> {
    let rainfall = rainfall
        .lazy()
        .select([col("*").exclude(["ph"]), col("ph").alias("ph_rainfall")]);
    // Only the survey columns join in; soil temperature/humidity readings
    // would collide with the rainfall baselines and are not corpus fields.
    let soil = soil.lazy().select([
        col("crop_label"),
        col("year"),
        col("soil_type"),
        col("ph").alias("ph_soil"),
    ]);

    let joined = region
        .lazy()
        .join(
            rainfall,
            [col("crop_label")],
            [col("crop_label")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            soil,
            [col("crop_label"), col("year")],
            [col("crop_label"), col("year")],
            JoinArgs::new(JoinType::Left),
        );

    merge_first_present(joined, "ph", &["ph_rainfall", "ph_soil"])
        .collect()
        .with_context(|| "reconciliation join failed")
}

/// Explicit conflict merge: `target` takes the first non-missing value from
/// `sources` in priority order, then the source columns are dropped.
fn merge_first_present(lf: LazyFrame, target: &str, sources: &[&str]) -> LazyFrame {
    let priority: Vec<Expr> = sources.iter().map(|s| col(*s)).collect();
    let dropped: Vec<String> = sources.iter().map(|s| (*s).to_string()).collect();

    lf.with_column(coalesce(&priority).alias(target))
        .select([col("*").exclude(dropped)])
}

/// Full pipeline: load the three raw CSVs, normalize, reconcile.
///
/// Any stage failure surfaces as [`AdvisorError::Reconciliation`] carrying
/// the full cause chain.
pub fn reconcile_files(
    rainfall_path: &str,
    region_path: &str,
    soil_path: &str,
) -> Result<ReconciledCorpus, AdvisorError> {
    reconcile_pipeline(rainfall_path, region_path, soil_path)
        .map_err(|e| AdvisorError::Reconciliation(format!("{e:#}")))
}

fn reconcile_pipeline(
    rainfall_path: &str,
    region_path: &str,
    soil_path: &str,
) -> Result<ReconciledCorpus> {
    let rainfall = normalize_rainfall(load_csv(rainfall_path)?)?;
    let region = normalize_region(load_csv(region_path)?)?;
    let (soil, skipped_soil_rows) = normalize_soil(load_csv(soil_path)?)?;

    if skipped_soil_rows > 0 {
        tracing::warn!(
            skipped = skipped_soil_rows,
            "dropped soil rows with unparsable dates"
        );
    }

    let frame = reconcile(rainfall, region, soil)?;
    tracing::info!(
        records = frame.height(),
        skipped_soil_rows,
        "reconciliation complete"
    );

    Ok(ReconciledCorpus {
        frame,
        skipped_soil_rows,
    })
}

/// Materialize a reconciled frame into typed records.
pub fn extract_records(df: &DataFrame) -> Result<Vec<CropRecord>> {
    let crop_label = df.column("crop_label")?.str()?;
    let year = df.column("year")?.i32()?;
    let season = df.column("season")?.str()?;
    let state = df.column("state")?.str()?;
    let area = df.column("area")?.f64()?;
    let production = df.column("production")?.f64()?;
    let crop_yield = df.column("yield")?.f64()?;
    let n = df.column("N")?.f64()?;
    let p = df.column("P")?.f64()?;
    let k = df.column("K")?.f64()?;
    let temperature = df.column("temperature")?.f64()?;
    let humidity = df.column("humidity")?.f64()?;
    let ph = df.column("ph")?.f64()?;
    let soil_type = df.column("soil_type")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        // Both join keys come from the region table and are filtered
        // non-null during normalization.
        let (Some(label), Some(year)) = (crop_label.get(idx), year.get(idx)) else {
            continue;
        };

        records.push(CropRecord {
            crop_label: label.to_string(),
            year,
            season: season.get(idx).map(|s| s.to_string()),
            state: state.get(idx).map(|s| s.to_string()),
            area: area.get(idx),
            production: production.get(idx),
            crop_yield: crop_yield.get(idx),
            n: n.get(idx),
            p: p.get(idx),
            k: k.get(idx),
            temperature: temperature.get(idx),
            humidity: humidity.get(idx),
            ph: ph.get(idx),
            soil_type: soil_type.get(idx).map(|s| s.to_string()),
        });
    }

    Ok(records)
}

// ============================================================================
// Sensor corpus (rainfall dataset with the rainfall column retained)
// ============================================================================

/// The full rainfall/soil-chemistry dataset, label-normalized, used to
/// answer "what inputs does this crop usually get" queries. Read-only after
/// load.
pub struct SensorCorpus {
    frame: DataFrame,
}

impl SensorCorpus {
    /// Load and normalize the sensor CSV. Accepts either `label` or `crop`
    /// as the crop column name; the source file has carried both over time.
    pub fn load(path: &str) -> Result<Self> {
        let raw = load_csv(path)?;
        let label_col = if raw.get_column_names().iter().any(|c| c.as_str() == "label") {
            "label"
        } else {
            "crop"
        };

        let frame = raw
            .lazy()
            .select([
                normalize_crop_label(col(label_col)).alias("crop_label"),
                col("N").cast(DataType::Float64),
                col("P").cast(DataType::Float64),
                col("K").cast(DataType::Float64),
                col("temperature").cast(DataType::Float64),
                col("humidity").cast(DataType::Float64),
                col("ph").cast(DataType::Float64),
                col("rainfall").cast(DataType::Float64),
            ])
            .collect()
            .with_context(|| format!("failed to normalize sensor corpus: {}", path))?;

        tracing::info!(rows = frame.height(), "sensor corpus loaded");
        Ok(SensorCorpus { frame })
    }

    /// Wrap an already-normalized frame (tests build these in memory).
    pub fn from_frame(frame: DataFrame) -> Self {
        SensorCorpus { frame }
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Mean input levels for one crop, rounded to two decimals, rainfall
    /// echoed back in mm/year.
    pub fn recommended_inputs(&self, crop: &str) -> Result<RecommendedInputs, AdvisorError> {
        let needle = crop.trim().to_lowercase();

        let filtered = self
            .frame
            .clone()
            .lazy()
            .filter(col("crop_label").eq(lit(needle.clone())))
            .collect()
            .map_err(|e| AdvisorError::Corpus(e.to_string()))?;

        if filtered.height() == 0 {
            return Err(AdvisorError::UnknownCrop(needle));
        }

        let means = filtered
            .lazy()
            .select([
                col("N").mean(),
                col("P").mean(),
                col("K").mean(),
                col("temperature").mean(),
                col("humidity").mean(),
                col("ph").mean(),
                col("rainfall").mean(),
            ])
            .collect()
            .map_err(|e| AdvisorError::Corpus(e.to_string()))?;

        Ok(RecommendedInputs {
            n: round2(mean_of(&means, "N")?),
            p: round2(mean_of(&means, "P")?),
            k: round2(mean_of(&means, "K")?),
            temperature: round2(mean_of(&means, "temperature")?),
            humidity: round2(mean_of(&means, "humidity")?),
            ph: round2(mean_of(&means, "ph")?),
            rainfall: round2(mean_of(&means, "rainfall")? * RAINFALL_SCALE),
        })
    }
}

/// First value of a single-row mean frame; a null mean (all-null column)
/// surfaces as an error rather than a synthesized zero.
fn mean_of(df: &DataFrame, name: &str) -> Result<f64, AdvisorError> {
    df.column(name)
        .and_then(|c| c.f64())
        .map_err(|e| AdvisorError::Corpus(e.to_string()))?
        .get(0)
        .ok_or_else(|| AdvisorError::Corpus(format!("column '{}' has no values", name)))
}
