//! # Core Data Model
//!
//! The immutable `Dataset` the bootstrap reads from, and the records the
//! driver produces for every iteration. Coefficients are always keyed by the
//! *original* column index so that iterations fitted on different column
//! subsets remain comparable.

use crate::config::BootstrapConfig;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while assembling a `Dataset`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DatasetError {
    #[error(
        "The feature matrix has {features} rows but the response vector has {response} entries."
    )]
    MismatchedRows { features: usize, response: usize },
    #[error("{found} column names were supplied for a feature matrix with {expected} columns.")]
    MismatchedColumnNames { found: usize, expected: usize },
}

/// A feature matrix and response vector that the bootstrap only ever indexes into.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    response: Array1<f64>,
    column_names: Vec<String>,
}

impl Dataset {
    /// Builds a dataset with generated column names (`x0`, `x1`, ...).
    pub fn new(features: Array2<f64>, response: Array1<f64>) -> Result<Self, DatasetError> {
        let column_names = (0..features.ncols()).map(|j| format!("x{j}")).collect();
        Self::with_column_names(features, response, column_names)
    }

    pub fn with_column_names(
        features: Array2<f64>,
        response: Array1<f64>,
        column_names: Vec<String>,
    ) -> Result<Self, DatasetError> {
        if features.nrows() != response.len() {
            return Err(DatasetError::MismatchedRows {
                features: features.nrows(),
                response: response.len(),
            });
        }
        if column_names.len() != features.ncols() {
            return Err(DatasetError::MismatchedColumnNames {
                found: column_names.len(),
                expected: features.ncols(),
            });
        }
        Ok(Self {
            features,
            response,
            column_names,
        })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn response(&self) -> &Array1<f64> {
        &self.response
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0 || self.n_columns() == 0
    }
}

/// Which original columns an iteration's design matrix was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelection {
    /// Every column, in original order.
    All,
    /// A sampled subset of original column indices, ascending, no duplicates.
    Sampled(Vec<usize>),
}

impl ColumnSelection {
    /// Number of columns in the resampled design matrix.
    pub fn len(&self, n_columns: usize) -> usize {
        match self {
            Self::All => n_columns,
            Self::Sampled(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self, n_columns: usize) -> bool {
        self.len(n_columns) == 0
    }

    /// Original column index at position `position` of the resampled matrix.
    pub fn original_index(&self, position: usize) -> usize {
        match self {
            Self::All => position,
            Self::Sampled(indices) => indices[position],
        }
    }

    /// The explicit list of original column indices.
    pub fn to_indices(&self, n_columns: usize) -> Vec<usize> {
        match self {
            Self::All => (0..n_columns).collect(),
            Self::Sampled(indices) => indices.clone(),
        }
    }

    pub fn contains(&self, column: usize, n_columns: usize) -> bool {
        match self {
            Self::All => column < n_columns,
            Self::Sampled(indices) => indices.binary_search(&column).is_ok(),
        }
    }
}

/// The row and column draws that define one bootstrap resample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSampleSpec {
    pub row_indices: Vec<usize>,
    pub column_indices: ColumnSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationStatus {
    Success,
    Failure,
}

impl IterationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Everything recorded for a single bootstrap iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub iteration_index: usize,
    /// Fitted coefficients keyed by original column index. Empty on failure.
    pub coefficients: BTreeMap<usize, f64>,
    pub intercept: Option<f64>,
    /// Number of passes the solver reported, when it succeeded.
    pub solver_iterations: Option<usize>,
    pub sample_spec: BootstrapSampleSpec,
    pub status: IterationStatus,
    pub error_detail: Option<String>,
}

impl IterationResult {
    pub fn is_success(&self) -> bool {
        self.status == IterationStatus::Success
    }
}

/// The complete output of one bootstrap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub iterations: Vec<IterationResult>,
    /// The configuration that produced this result, with the seed resolved.
    pub config: BootstrapConfig,
    pub n_rows: usize,
    pub n_columns: usize,
    pub column_names: Vec<String>,
}

impl BootstrapResult {
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn n_successful(&self) -> usize {
        self.iterations.iter().filter(|it| it.is_success()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.len() - self.n_successful()
    }

    /// Fraction of failed iterations, `0.0` for an empty result.
    pub fn failure_rate(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.n_failed() as f64 / self.len() as f64
        }
    }

    pub fn successful(&self) -> impl Iterator<Item = &IterationResult> {
        self.iterations.iter().filter(|it| it.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &IterationResult> {
        self.iterations.iter().filter(|it| !it.is_success())
    }

    /// Every fitted value of one original column, in iteration order.
    pub fn coefficient_draws(&self, column: usize) -> Vec<f64> {
        self.successful()
            .filter_map(|it| it.coefficients.get(&column).copied())
            .collect()
    }
}
