//! Scale scoring
//!
//! Computes mean composite scores from item-level survey columns, with
//! reverse-coding where the instrument calls for it. Means ignore missing
//! items; an all-missing block yields a missing score, and a missing operand
//! makes SPANE balance missing.

use crate::stats::mean_ignoring_missing;
use crate::types::{ScaleScores, SurveyResponse};

/// SPANE items are rated 1-5
pub const SPANE_POINTS: f64 = 5.0;

/// Motivation items are rated 1-7
pub const MOTIVATION_POINTS: f64 = 7.0;

/// Zero-based indices of reverse-coded items within the extrinsic block
pub const EXTRINSIC_REVERSED: &[usize] = &[1, 3];

/// Reverse-code a single item on a `points`-point scale
pub fn reverse_code(value: Option<f64>, points: f64) -> Option<f64> {
    value.map(|v| points + 1.0 - v)
}

/// Score one respondent's item blocks into composite scores
pub fn score_survey(response: &SurveyResponse) -> ScaleScores {
    let spane_positive = mean_ignoring_missing(&response.spane_positive);
    let spane_negative = mean_ignoring_missing(&response.spane_negative);

    let spane_balance = match (spane_positive, spane_negative) {
        (Some(pos), Some(neg)) => Some(pos - neg),
        _ => None,
    };

    let intrinsic = mean_ignoring_missing(&response.motivation_intrinsic);

    let extrinsic_items: Vec<Option<f64>> = response
        .motivation_extrinsic
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if EXTRINSIC_REVERSED.contains(&i) {
                reverse_code(*item, MOTIVATION_POINTS)
            } else {
                *item
            }
        })
        .collect();
    let extrinsic = mean_ignoring_missing(&extrinsic_items);

    ScaleScores {
        spane_positive,
        spane_negative,
        spane_balance,
        intrinsic,
        extrinsic,
    }
}
