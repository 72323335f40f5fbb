//! The penalized-regression seam.
//!
//! The bootstrap driver never looks inside a solver: it hands over a design
//! matrix, a response and the `LassoParams`, and gets back one coefficient
//! per design column or a `SolverError`. `CoordinateDescentLasso` is the
//! bundled implementation.

use crate::config::LassoParams;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

/// Column norms below this are treated as constant columns.
const ZERO_VARIANCE_THRESHOLD: f64 = 1e-12;

/// Output of a successful penalized fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PenalizedFit {
    /// One coefficient per column of the design matrix, in column order.
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Number of coordinate sweeps performed.
    pub iterations: usize,
}

/// Failures a solver can report for a single fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error(
        "Coordinate descent did not converge within {max_iterations} sweeps. Last maximum coefficient change was {last_change:.6e}."
    )]
    DidNotConverge {
        max_iterations: usize,
        last_change: f64,
    },
    #[error("The design matrix is ill-conditioned: {0}")]
    IllConditioned(String),
    #[error("Non-finite values were found in the {0}.")]
    NonFiniteInput(&'static str),
    #[error("Cannot fit with zero samples.")]
    NoSamples,
    #[error("The design matrix has {rows} rows but the response has {response} entries.")]
    DimensionMismatch { rows: usize, response: usize },
}

/// A penalized linear regression routine.
pub trait PenalizedRegression {
    /// Fits `y ~ x` under `params`. The returned coefficients must be
    /// positionally aligned with the columns of `x`.
    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        params: &LassoParams,
    ) -> Result<PenalizedFit, SolverError>;
}

impl<S: PenalizedRegression + ?Sized> PenalizedRegression for &S {
    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        params: &LassoParams,
    ) -> Result<PenalizedFit, SolverError> {
        (**self).fit(x, y, params)
    }
}

/// Cyclic coordinate descent with soft-thresholding.
///
/// Minimizes `(1 / 2n) * ||y - Xb - b0||^2 + alpha * ||b||_1`. With
/// `fit_intercept` the columns and response are centered first and the
/// intercept is recovered afterwards. Constant columns keep a zero
/// coefficient unless `reject_constant_columns` is set, in which case the fit
/// fails as ill-conditioned.
#[derive(Debug, Clone, Default)]
pub struct CoordinateDescentLasso {
    pub reject_constant_columns: bool,
}

impl CoordinateDescentLasso {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_constant_columns() -> Self {
        Self {
            reject_constant_columns: true,
        }
    }
}

/// `sign(value) * max(|value| - threshold, 0)`.
pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl PenalizedRegression for CoordinateDescentLasso {
    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        params: &LassoParams,
    ) -> Result<PenalizedFit, SolverError> {
        let (n_samples, n_features) = x.dim();
        if n_samples != y.len() {
            return Err(SolverError::DimensionMismatch {
                rows: n_samples,
                response: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(SolverError::NoSamples);
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteInput("design matrix"));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteInput("response"));
        }

        let (x_means, y_mean) = if params.fit_intercept {
            // mean_axis only returns None for an empty axis, ruled out above
            let x_means = x
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_features));
            (x_means, y.sum() / n_samples as f64)
        } else {
            (Array1::zeros(n_features), 0.0)
        };
        let xc = &x - &x_means;
        let mut residual = &y - y_mean;

        let col_norms_sq: Array1<f64> = xc.map_axis(Axis(0), |col| col.dot(&col));
        if self.reject_constant_columns {
            if let Some(j) = col_norms_sq
                .iter()
                .position(|&norm| norm < ZERO_VARIANCE_THRESHOLD)
            {
                return Err(SolverError::IllConditioned(format!(
                    "design column {j} has zero variance in this sample"
                )));
            }
        }

        let l1_penalty = params.alpha * n_samples as f64;
        let mut beta = Array1::<f64>::zeros(n_features);
        let mut last_change = f64::INFINITY;

        for sweep in 1..=params.max_iterations {
            let mut max_change = 0.0f64;
            for j in 0..n_features {
                if col_norms_sq[j] < ZERO_VARIANCE_THRESHOLD {
                    continue;
                }
                let column = xc.column(j);
                let old_beta = beta[j];
                // Correlation of column j with the partial residual that excludes j.
                let rho = column.dot(&residual) + col_norms_sq[j] * old_beta;
                let new_beta = soft_threshold(rho, l1_penalty) / col_norms_sq[j];
                let delta = new_beta - old_beta;
                if delta != 0.0 {
                    residual.scaled_add(-delta, &column);
                    beta[j] = new_beta;
                }
                max_change = max_change.max(delta.abs());
            }
            last_change = max_change;

            if !max_change.is_finite() {
                return Err(SolverError::IllConditioned(
                    "coefficient updates became non-finite".to_string(),
                ));
            }
            if max_change < params.tolerance {
                let intercept = if params.fit_intercept {
                    y_mean - x_means.dot(&beta)
                } else {
                    0.0
                };
                return Ok(PenalizedFit {
                    coefficients: beta,
                    intercept,
                    iterations: sweep,
                });
            }
        }

        Err(SolverError::DidNotConverge {
            max_iterations: params.max_iterations,
            last_change,
        })
    }
}
