//! Data-quality filtering
//!
//! Two policies run after the merge: straightliner exclusion (disengaged
//! responding) and per-variable z-score outlier nulling. Both preserve the
//! pre-exclusion snapshot; exclusions only shape the final output table.

use crate::stats::{sample_sd, VariableStats};
use crate::types::PlayerRow;
use tracing::debug;

/// Absolute z-score at or above which a value is nulled
pub const OUTLIER_Z_THRESHOLD: f64 = 6.0;

/// Straightliner check for one scale block.
///
/// Flags when the sample standard deviation of the respondent's non-missing
/// answers is exactly zero (every answer identical). Fewer than 2 non-missing
/// items leaves the statistic undefined and returns a missing flag, which the
/// composite rule treats as "not excluded".
pub fn straightline_flag(block: &[Option<f64>]) -> Option<bool> {
    sample_sd(block).map(|sd| sd == 0.0)
}

/// Composite exclusion rule: excluded only when flagged on BOTH the affect
/// and motivation blocks. A missing flag on either block passes.
pub fn is_straightliner_excluded(affect: Option<bool>, motivation: Option<bool>) -> bool {
    affect.unwrap_or(false) && motivation.unwrap_or(false)
}

/// A numeric variable subject to outlier nulling
struct OutlierVariable {
    name: &'static str,
    get: fn(&PlayerRow) -> Option<f64>,
    clear: fn(&mut PlayerRow),
}

/// Allow-list of variables checked for outliers. Counts are left alone; only
/// the continuous measures are nulled.
const OUTLIER_VARIABLES: &[OutlierVariable] = &[
    OutlierVariable {
        name: "self_reported_hours",
        get: |r| r.self_reported_hours,
        clear: |r| r.self_reported_hours = None,
    },
    OutlierVariable {
        name: "total_hours",
        get: |r| r.summary.total_hours,
        clear: |r| r.summary.total_hours = None,
    },
    OutlierVariable {
        name: "xp_total",
        get: |r| r.summary.xp_total,
        clear: |r| r.summary.xp_total = None,
    },
];

/// Null out extreme values in place, per variable, per row.
///
/// Two passes per variable: whole-sample mean/SD over the non-missing values,
/// then `|z| >= 6` replaces the single cell with missing. Rows are always
/// retained; a respondent can lose one reading and keep the rest.
///
/// Returns the number of cells nulled.
pub fn null_outliers(rows: &mut [PlayerRow]) -> usize {
    let mut nulled = 0;

    for variable in OUTLIER_VARIABLES {
        let values: Vec<Option<f64>> = rows.iter().map(|r| (variable.get)(r)).collect();
        let Some(stats) = VariableStats::compute(&values) else {
            continue;
        };

        for row in rows.iter_mut() {
            if let Some(value) = (variable.get)(row) {
                if stats.z_score(value).abs() >= OUTLIER_Z_THRESHOLD {
                    (variable.clear)(row);
                    nulled += 1;
                }
            }
        }

        debug!(variable = variable.name, n = stats.n, "outlier pass complete");
    }

    nulled
}

/// Drop straightliner-excluded rows and null outliers, producing the
/// "exclusions applied" view of the merged table.
pub fn apply_exclusions(rows: &[PlayerRow]) -> Vec<PlayerRow> {
    let mut kept: Vec<PlayerRow> = rows
        .iter()
        .filter(|r| !is_straightliner_excluded(r.straightliner_affect, r.straightliner_motivation))
        .cloned()
        .collect();

    let nulled = null_outliers(&mut kept);
    debug!(
        dropped = rows.len() - kept.len(),
        nulled, "applied quality exclusions"
    );

    kept
}
