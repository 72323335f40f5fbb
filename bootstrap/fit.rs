//! Calls the solver on one resample and maps its positional coefficients back
//! onto original column indices.

use crate::config::LassoParams;
use crate::solver::PenalizedRegression;
use crate::types::ColumnSelection;
use ndarray::{ArrayView1, ArrayView2};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Coefficients could not be attributed to original columns. This points at
/// a bug in the solver or the driver, never at the data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error(
        "Iteration {iteration}: the solver returned {found} coefficients for a design with {expected} columns."
    )]
    LengthMismatch {
        iteration: usize,
        expected: usize,
        found: usize,
    },
    #[error("Iteration {iteration}: column index {column} is outside the {n_columns} original columns.")]
    ColumnOutOfRange {
        iteration: usize,
        column: usize,
        n_columns: usize,
    },
    #[error("Iteration {iteration}: original column {column} was sampled more than once.")]
    DuplicateColumn { iteration: usize, column: usize },
}

/// Result of fitting one resample, before it is recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Success {
        coefficients: BTreeMap<usize, f64>,
        intercept: f64,
        solver_iterations: usize,
    },
    /// A recoverable per-iteration failure with its description.
    Failure(String),
}

/// Fits one resample and aligns the coefficients.
///
/// Solver errors and solver panics become `FitOutcome::Failure`. Only an
/// alignment problem is returned as `Err`.
pub fn fit_and_align<S: PenalizedRegression + ?Sized>(
    solver: &S,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    params: &LassoParams,
    columns: &ColumnSelection,
    n_columns: usize,
    iteration: usize,
) -> Result<FitOutcome, AlignmentError> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| solver.fit(x, y, params)));
    let fit = match attempt {
        Ok(Ok(fit)) => fit,
        Ok(Err(err)) => return Ok(FitOutcome::Failure(err.to_string())),
        Err(payload) => {
            return Ok(FitOutcome::Failure(format!(
                "solver panicked: {}",
                panic_message(payload.as_ref())
            )));
        }
    };

    let expected = columns.len(n_columns);
    if fit.coefficients.len() != expected {
        return Err(AlignmentError::LengthMismatch {
            iteration,
            expected,
            found: fit.coefficients.len(),
        });
    }

    let mut coefficients = BTreeMap::new();
    for (position, &value) in fit.coefficients.iter().enumerate() {
        let column = columns.original_index(position);
        if column >= n_columns {
            return Err(AlignmentError::ColumnOutOfRange {
                iteration,
                column,
                n_columns,
            });
        }
        if coefficients.insert(column, value).is_some() {
            return Err(AlignmentError::DuplicateColumn { iteration, column });
        }
    }

    if let Some((column, value)) = coefficients.iter().find(|(_, v)| !v.is_finite()) {
        return Ok(FitOutcome::Failure(format!(
            "solver returned a non-finite coefficient ({value}) for column {column}"
        )));
    }
    if !fit.intercept.is_finite() {
        return Ok(FitOutcome::Failure(format!(
            "solver returned a non-finite intercept ({})",
            fit.intercept
        )));
    }

    Ok(FitOutcome::Success {
        coefficients,
        intercept: fit.intercept,
        solver_iterations: fit.iterations,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
