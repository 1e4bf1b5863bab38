//! Rule-based crop suitability scoring.
//!
//! Complements the trained classifier: every crop in the reference table is
//! scored against the supplied field conditions and the best matches come
//! back as a ranked shortlist. Scores stay internal; callers only see
//! labels. An empty shortlist is a valid answer, not an error.

use crate::reference::{ReferenceCropProfile, ReferenceTable};
use crate::types::FieldConditions;

/// pH band that counts as a positive soil signal.
const PH_MIN: f64 = 5.5;
const PH_MAX: f64 = 7.5;

/// Minimum score a crop needs to make the shortlist: at least one range
/// match plus one nutrient/pH signal, or both range matches.
const SCORE_THRESHOLD: u8 = 3;

/// Shortlist length returned to callers.
const SHORTLIST_LEN: usize = 5;

/// A crop plus its heuristic match score (0–6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitabilityCandidate {
    pub crop: String,
    pub score: u8,
}

/// Score one profile against the field conditions.
///
/// Two points per envelope range hit (temperature, rainfall), one point for
/// pH in the arable band, one point when all three macronutrients are
/// present. Range checks are inclusive at both ends.
fn envelope_score(profile: &ReferenceCropProfile, conditions: &FieldConditions) -> u8 {
    let mut score = 0;

    if profile.temperature.contains(conditions.temperature) {
        score += 2;
    }
    if profile.rainfall.contains(conditions.rainfall) {
        score += 2;
    }
    if conditions.ph >= PH_MIN && conditions.ph <= PH_MAX {
        score += 1;
    }
    if conditions.n > 0.0 && conditions.p > 0.0 && conditions.k > 0.0 {
        score += 1;
    }

    score
}

/// Rank every crop that clears the threshold, best first.
///
/// Ordering: score descending, then the profile's yield ceiling descending
/// (higher-ceiling crops win score ties), then label ascending so identical
/// inputs always produce the identical ranking.
pub fn rank_candidates(
    table: &ReferenceTable,
    conditions: &FieldConditions,
) -> Vec<SuitabilityCandidate> {
    let mut candidates: Vec<(SuitabilityCandidate, f64)> = table
        .iter()
        .filter_map(|(crop, profile)| {
            let score = envelope_score(profile, conditions);
            if score >= SCORE_THRESHOLD {
                Some((
                    SuitabilityCandidate {
                        crop: crop.clone(),
                        score,
                    },
                    profile.yield_estimate.max,
                ))
            } else {
                None
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.0.score
            .cmp(&a.0.score)
            .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.0.crop.cmp(&b.0.crop))
    });

    candidates.into_iter().map(|(candidate, _)| candidate).collect()
}

/// Top-5 shortlist of crop labels for the given conditions.
pub fn score_conditions(table: &ReferenceTable, conditions: &FieldConditions) -> Vec<String> {
    rank_candidates(table, conditions)
        .into_iter()
        .take(SHORTLIST_LEN)
        .map(|candidate| candidate.crop)
        .collect()
}
