//! Per-column summaries of a finished bootstrap: centre, spread, percentile
//! confidence interval and how often the Lasso kept the column.

use crate::types::BootstrapResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("The confidence level must lie strictly between 0 and 1, got {0}.")]
    InvalidConfidenceLevel(f64),
}

/// Bootstrap statistics for one original column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column_index: usize,
    pub column_name: String,
    /// Successful iterations whose resample included this column.
    pub n_included: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation of the draws (n - 1 denominator).
    pub std_error: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// Fraction of inclusions in which the coefficient was nonzero.
    pub selection_frequency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    pub confidence_level: f64,
    pub n_iterations: usize,
    pub n_failed: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Linear-interpolation quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Accepts levels strictly inside `(0, 1)`.
pub fn validate_confidence_level(confidence_level: f64) -> Result<(), SummaryError> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(SummaryError::InvalidConfidenceLevel(confidence_level));
    }
    Ok(())
}

pub fn summarize(
    result: &BootstrapResult,
    confidence_level: f64,
) -> Result<BootstrapSummary, SummaryError> {
    validate_confidence_level(confidence_level)?;
    let tail = (1.0 - confidence_level) / 2.0;

    let columns = (0..result.n_columns)
        .map(|column| {
            let mut draws = result.coefficient_draws(column);
            let n = draws.len();
            let mean = (n > 0).then(|| draws.iter().sum::<f64>() / n as f64);
            let std_error = mean.filter(|_| n > 1).map(|m| {
                let ss: f64 = draws.iter().map(|b| (b - m).powi(2)).sum();
                (ss / (n - 1) as f64).sqrt()
            });
            let selected = draws.iter().filter(|&&b| b != 0.0).count();
            draws.sort_by(f64::total_cmp);

            ColumnSummary {
                column_index: column,
                column_name: result
                    .column_names
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| format!("x{column}")),
                n_included: n,
                mean,
                std_error,
                ci_lower: quantile_sorted(&draws, tail),
                ci_upper: quantile_sorted(&draws, 1.0 - tail),
                selection_frequency: (n > 0).then(|| selected as f64 / n as f64),
            }
        })
        .collect();

    Ok(BootstrapSummary {
        confidence_level,
        n_iterations: result.len(),
        n_failed: result.n_failed(),
        columns,
    })
}
