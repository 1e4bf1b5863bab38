//! Water advisory evaluation.
//!
//! Compares the requested crop's reference envelope against supplied field
//! conditions and emits one advice line per check, in a fixed order:
//! temperature, rainfall, cycle-duration sanity, water scarcity. The
//! temperature and rainfall checks always produce exactly one line each;
//! the last two are additive.

use serde::Serialize;

use crate::error::AdvisorError;
use crate::reference::ReferenceTable;

/// Inputs for one advisory evaluation. Soil and irrigation types are
/// display-only; they are echoed back untouched.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub crop_name: String,
    pub temperature: f64,
    pub rainfall: f64,
    pub expected_yield: f64,
    pub cycle_duration_days: u32,
    pub soil_type: String,
    pub irrigation_type: String,
    pub water_scarcity: String,
}

/// Advisory output: echoed request context, the crop's reference strings
/// verbatim, and the generated advice lines.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryResult {
    pub crop: String,
    pub soil_type: String,
    pub irrigation_type: String,
    pub water_scarcity: String,
    pub predicted_water_use: String,
    pub predicted_temperature_requirement: String,
    pub predicted_rainfall_requirement: String,
    pub cycle_duration_days: String,
    pub yield_estimate: String,
    pub advice_lines: Vec<String>,
}

impl AdvisoryResult {
    /// Advice lines joined into the single display string the original
    /// response carried.
    pub fn advice_text(&self) -> String {
        self.advice_lines.join(" ")
    }
}

/// Evaluate the advisory checks for one crop.
///
/// Fails with [`AdvisorError::UnknownCrop`] when the label has no reference
/// profile; every other path produces advice, never an error.
pub fn advise(
    table: &ReferenceTable,
    request: &AdvisoryRequest,
) -> Result<AdvisoryResult, AdvisorError> {
    let profile = table
        .get(&request.crop_name)
        .ok_or_else(|| AdvisorError::UnknownCrop(request.crop_name.clone()))?;

    let mut advice = Vec::new();

    // 1. Temperature: exactly one of the three fires; endpoints are "suitable".
    if request.temperature < profile.temperature.min {
        advice.push("Temperature is too low, crop may not grow well.".to_string());
    } else if request.temperature > profile.temperature.max {
        advice.push("Temperature is too high, heat stress likely.".to_string());
    } else {
        advice.push("Temperature is suitable.".to_string());
    }

    // 2. Rainfall: same exclusivity rule.
    if request.rainfall < profile.rainfall.min {
        advice.push("Rainfall insufficient, irrigation required.".to_string());
    } else if request.rainfall > profile.rainfall.max {
        advice.push("Excess rainfall, ensure drainage to prevent flooding.".to_string());
    } else {
        advice.push("Rainfall conditions are adequate.".to_string());
    }

    // 3. Cycle-duration sanity (additive).
    if request.cycle_duration_days > 365 {
        advice.push("Crop cycle duration is unrealistic, check inputs.".to_string());
    }

    // 4. Water scarcity (additive, case-insensitive match on "high").
    if request.water_scarcity.trim().eq_ignore_ascii_case("high") {
        advice.push("Water scarcity is high, use drip irrigation if possible.".to_string());
    }

    // Unreachable while checks 1-2 always fire, but the contract promises a
    // non-empty advice list.
    if advice.is_empty() {
        advice.push("Conditions are stable. Monitor regularly.".to_string());
    }

    Ok(AdvisoryResult {
        crop: request.crop_name.trim().to_lowercase(),
        soil_type: request.soil_type.clone(),
        irrigation_type: request.irrigation_type.clone(),
        water_scarcity: request.water_scarcity.clone(),
        predicted_water_use: profile.water_use_display.clone(),
        predicted_temperature_requirement: profile.temperature_display.clone(),
        predicted_rainfall_requirement: profile.rainfall_display.clone(),
        cycle_duration_days: profile.cycle_days_display.clone(),
        yield_estimate: profile.yield_estimate_display.clone(),
        advice_lines: advice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceTable;

    fn request(crop: &str, temperature: f64, rainfall: f64, cycle: u32, scarcity: &str) -> AdvisoryRequest {
        AdvisoryRequest {
            crop_name: crop.to_string(),
            temperature,
            rainfall,
            expected_yield: 0.0,
            cycle_duration_days: cycle,
            soil_type: "Loam".to_string(),
            irrigation_type: "Canal".to_string(),
            water_scarcity: scarcity.to_string(),
        }
    }

    fn table() -> ReferenceTable {
        ReferenceTable::builtin().unwrap()
    }

    #[test]
    fn rice_heat_stress_scenario() {
        // 40 °C is above rice's 20-35 band, 1500 mm sits inside 1000-2000,
        // the cycle is realistic and scarcity is low.
        let result = advise(&table(), &request("rice", 40.0, 1500.0, 120, "Low")).unwrap();
        assert_eq!(result.advice_lines.len(), 2);
        assert!(result.advice_lines[0].contains("heat stress"));
        assert!(result.advice_lines[1].contains("adequate"));
        assert_eq!(result.predicted_rainfall_requirement, "1000–2000 mm/year");
    }

    #[test]
    fn boundary_temperature_is_suitable() {
        // Exactly on both endpoints of rice's range: "suitable", not a warning.
        let low = advise(&table(), &request("rice", 20.0, 1500.0, 120, "Low")).unwrap();
        assert!(low.advice_lines[0].contains("suitable"));

        let high = advise(&table(), &request("rice", 35.0, 1500.0, 120, "Low")).unwrap();
        assert!(high.advice_lines[0].contains("suitable"));
    }

    #[test]
    fn additive_warnings_stack_in_order() {
        let result = advise(&table(), &request("wheat", 10.0, 100.0, 400, "HIGH")).unwrap();
        assert_eq!(result.advice_lines.len(), 4);
        assert!(result.advice_lines[0].contains("too low"));
        assert!(result.advice_lines[1].contains("insufficient"));
        assert!(result.advice_lines[2].contains("unrealistic"));
        assert!(result.advice_lines[3].contains("drip irrigation"));

        let joined = result.advice_text();
        assert!(joined.starts_with("Temperature is too low"));
        assert!(joined.ends_with("drip irrigation if possible."));
    }

    #[test]
    fn unknown_crop_is_an_error() {
        let err = advise(&table(), &request("dragonfruit", 25.0, 800.0, 90, "Low")).unwrap_err();
        assert!(matches!(err, AdvisorError::UnknownCrop(_)));
    }

    #[test]
    fn crop_lookup_ignores_case_and_whitespace() {
        let result = advise(&table(), &request("  Rice ", 25.0, 1500.0, 120, "Low")).unwrap();
        assert_eq!(result.crop, "rice");
    }
}
