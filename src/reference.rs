//! Static crop reference table.
//!
//! Each crop carries an agronomic envelope: temperature, rainfall, cycle
//! length and yield-estimate ranges plus a water-use figure. The table is
//! plain JSON so agronomists can edit it without code changes; range strings
//! like "20–35 °C" are parsed into structured `{min, max}` pairs once at
//! load time and never re-parsed per request.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Inclusive numeric range. Both endpoints count as "inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Raw JSON shape of one crop entry, matching the hand-maintained file.
#[derive(Debug, Deserialize)]
struct RawProfile {
    water_use: String,
    temperature: String,
    rainfall: String,
    cycle_days: String,
    yield_estimate: String,
}

/// Agronomic envelope for one crop.
///
/// Keeps both the parsed ranges (for comparisons) and the original display
/// strings (advisory responses echo them verbatim).
#[derive(Debug, Clone)]
pub struct ReferenceCropProfile {
    pub temperature: Range,
    pub rainfall: Range,
    pub cycle_days: Range,
    pub yield_estimate: Range,
    pub water_use_display: String,
    pub temperature_display: String,
    pub rainfall_display: String,
    pub cycle_days_display: String,
    pub yield_estimate_display: String,
}

/// Crop name (lowercased) → agronomic envelope. Loaded once at startup,
/// read-only afterwards.
#[derive(Debug)]
pub struct ReferenceTable {
    profiles: FxHashMap<String, ReferenceCropProfile>,
}

impl ReferenceTable {
    /// Load the reference table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read reference table: {:?}", path))?;
        Self::from_json_str(&contents)
    }

    /// Parse the reference table from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: FxHashMap<String, RawProfile> =
            serde_json::from_str(json).with_context(|| "failed to parse reference table JSON")?;

        let mut profiles = FxHashMap::default();
        for (crop, entry) in raw {
            let profile = ReferenceCropProfile {
                temperature: parse_range(&entry.temperature)
                    .with_context(|| format!("bad temperature range for '{}'", crop))?,
                rainfall: parse_range(&entry.rainfall)
                    .with_context(|| format!("bad rainfall range for '{}'", crop))?,
                cycle_days: parse_range(&entry.cycle_days)
                    .with_context(|| format!("bad cycle range for '{}'", crop))?,
                yield_estimate: parse_range(&entry.yield_estimate)
                    .with_context(|| format!("bad yield range for '{}'", crop))?,
                water_use_display: entry.water_use,
                temperature_display: entry.temperature,
                rainfall_display: entry.rainfall,
                cycle_days_display: entry.cycle_days,
                yield_estimate_display: entry.yield_estimate,
            };
            profiles.insert(crop.trim().to_lowercase(), profile);
        }

        Ok(ReferenceTable { profiles })
    }

    /// Built-in table with the ten baseline crops, embedded at compile time.
    /// The same file can be overridden at runtime via [`ReferenceTable::load`].
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(include_str!("../data/reference_crops.json"))
    }

    /// Look up a crop by name; trimming and casing are normalized here so
    /// lookups match the join-key convention used everywhere else.
    pub fn get(&self, crop: &str) -> Option<&ReferenceCropProfile> {
        self.profiles.get(&crop.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReferenceCropProfile)> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Parse "20–35 °C" / "1000-2000 mm/year" / "100–150" into a [`Range`].
///
/// Accepts en-dash or hyphen separators and ignores any unit suffix after
/// the number.
fn parse_range(raw: &str) -> Result<Range> {
    let normalized = raw.replace('–', "-");
    let mut parts = normalized.splitn(2, '-');

    let min = parts
        .next()
        .and_then(leading_number)
        .with_context(|| format!("no lower bound in range '{}'", raw))?;
    let max = parts
        .next()
        .and_then(leading_number)
        .with_context(|| format!("no upper bound in range '{}'", raw))?;

    if min > max {
        anyhow::bail!("inverted range '{}'", raw);
    }

    Ok(Range { min, max })
}

/// Leading numeric token of a string like "35 °C" or "2000mm".
fn leading_number(s: &str) -> Option<f64> {
    let token: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    token.parse().ok()
}
