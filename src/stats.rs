//! Missing-aware numeric helpers
//!
//! Aggregations over survey items and telemetry measures use "ignore missing"
//! semantics: absent values drop out of the computation rather than counting
//! as zero, and an all-missing input yields a missing result.

/// Mean of the present values; `None` when no value is present
pub fn mean_ignoring_missing(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// Sum of the present values; `None` when no value is present
pub fn sum_ignoring_missing(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum())
}

/// Sample standard deviation (n-1) of the present values.
///
/// Returns `None` with fewer than 2 present values; the statistic is
/// undefined there and callers treat it as missing, not as zero.
pub fn sample_sd(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() < 2 {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let sum_sq: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (n - 1.0)).sqrt())
}

/// Whole-sample mean and sample standard deviation for one variable.
///
/// First pass of the two-pass z-score design: summary statistics are computed
/// across the full analysis sample before any threshold is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableStats {
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
}

impl VariableStats {
    /// Compute stats over the non-missing values of one variable.
    ///
    /// `None` when fewer than 2 values are present or the variable is
    /// constant (sd = 0); a z-score is undefined in either case.
    pub fn compute(values: &[Option<f64>]) -> Option<Self> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let sd = sample_sd(values)?;
        if sd == 0.0 {
            return None;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        Some(VariableStats {
            mean,
            sd,
            n: present.len(),
        })
    }

    /// Z-score of one value against these stats
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.sd
    }
}
