//! Return-on-investment arithmetic.
//!
//! Pure transform from yield, price and investment to revenue and return
//! percentage. The non-positive-investment case is rejected up front so the
//! division can never produce infinities or NaN.

use serde::Serialize;

use crate::error::AdvisorError;
use crate::types::round2;

/// ROI response: the request values echoed back plus the derived numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiResult {
    pub crop: String,
    pub investment: f64,
    pub expected_yield: f64,
    pub market_price: f64,
    pub revenue: f64,
    pub roi_percent: f64,
}

/// Compute revenue and return percentage for one crop cycle.
///
/// `revenue = expected_yield × market_price`;
/// `roi_percent = (revenue − investment) / investment × 100`, rounded to
/// two decimals.
pub fn calculate_roi(
    crop: &str,
    investment: f64,
    expected_yield: f64,
    market_price: f64,
) -> Result<RoiResult, AdvisorError> {
    // Also catches NaN, which fails every comparison.
    if !(investment > 0.0) {
        return Err(AdvisorError::InvalidInvestment(investment));
    }
    if !expected_yield.is_finite() {
        return Err(AdvisorError::validation("expected_yield", "must be finite"));
    }
    if !market_price.is_finite() {
        return Err(AdvisorError::validation("market_price", "must be finite"));
    }

    let revenue = expected_yield * market_price;
    let roi_percent = round2((revenue - investment) / investment * 100.0);

    Ok(RoiResult {
        crop: crop.to_string(),
        investment,
        expected_yield,
        market_price,
        revenue,
        roi_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn baseline_roi() {
        let result = calculate_roi("wheat", 1000.0, 500.0, 3.0).unwrap();
        assert_relative_eq!(result.revenue, 1500.0);
        assert_relative_eq!(result.roi_percent, 50.0);
    }

    #[test]
    fn loss_making_roi_goes_negative() {
        let result = calculate_roi("cotton", 2000.0, 100.0, 5.0).unwrap();
        assert_relative_eq!(result.revenue, 500.0);
        assert_relative_eq!(result.roi_percent, -75.0);
    }

    #[test]
    fn roi_is_rounded_to_two_decimals() {
        // (1000 - 300) / 300 * 100 = 233.333...
        let result = calculate_roi("maize", 300.0, 500.0, 2.0).unwrap();
        assert_relative_eq!(result.roi_percent, 233.33);
    }

    #[test]
    fn non_positive_investment_is_rejected() {
        assert!(matches!(
            calculate_roi("rice", 0.0, 500.0, 3.0),
            Err(AdvisorError::InvalidInvestment(_))
        ));
        assert!(matches!(
            calculate_roi("rice", -50.0, 500.0, 3.0),
            Err(AdvisorError::InvalidInvestment(_))
        ));
        assert!(matches!(
            calculate_roi("rice", f64::NAN, 500.0, 3.0),
            Err(AdvisorError::InvalidInvestment(_))
        ));
    }
}
