//! # Data Loading and Validation Module
//!
//! Reads a tab-separated file with a header row into a `Dataset`. One column
//! is the response; every other column is a feature, kept in file order so
//! that original column indices match the header.
//!
//! Failures are assumed to be user-input errors, and `DataError` is worded
//! to say what to fix.

use crate::types::{Dataset, DatasetError};
use ndarray::{Array1, Array2};
use std::path::Path;
use thiserror::Error;

/// Minimum number of data rows accepted for a bootstrap.
pub const MINIMUM_ROWS: usize = 2;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error reading the tab-separated input: {0}")]
    CsvError(#[from] csv::Error),
    #[error(
        "The response column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error("The input file has no feature columns besides the response column '{0}'.")]
    NoFeatureColumns(String),
    #[error(
        "Column '{column_name}' contains the non-numeric value '{value}' on data row {row}."
    )]
    NonNumericValue {
        column_name: String,
        row: usize,
        value: String,
    },
    #[error(
        "Missing values were found in column '{0}'. This tool requires complete data with no missing values."
    )]
    MissingValuesFound(String),
    #[error(
        "Non-finite values (NaN or Infinity) were found in column '{0}'. This tool requires all data to be finite."
    )]
    NonFiniteValuesFound(String),
    #[error("Input file contains only {found} data rows, but at least {required} are required.")]
    InsufficientRows { found: usize, required: usize },
    #[error("Data row {row} has {found} fields, but the header has {expected}.")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Failed to assemble the feature matrix: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Loads a dataset from a TSV file, using `response_column` as the response.
pub fn load_dataset(path: impl AsRef<Path>, response_column: &str) -> Result<Dataset, DataError> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    read_dataset(reader, response_column)
}

/// Parses a dataset from any reader producing TSV text.
pub fn read_dataset_from<R: std::io::Read>(
    input: R,
    response_column: &str,
) -> Result<Dataset, DataError> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    read_dataset(reader, response_column)
}

fn read_dataset<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    response_column: &str,
) -> Result<Dataset, DataError> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let response_idx = headers
        .iter()
        .position(|h| h == response_column)
        .ok_or_else(|| DataError::ColumnNotFound(response_column.to_string()))?;
    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != response_idx)
        .map(|(_, name)| name.clone())
        .collect();
    if feature_names.is_empty() {
        return Err(DataError::NoFeatureColumns(response_column.to_string()));
    }

    let mut features = Vec::new();
    let mut response = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DataError::RaggedRow {
                row: row + 1,
                found: record.len(),
                expected: headers.len(),
            });
        }
        for (idx, field) in record.iter().enumerate() {
            let value = parse_field(field, &headers[idx], row + 1)?;
            if idx == response_idx {
                response.push(value);
            } else {
                features.push(value);
            }
        }
    }

    let n_rows = response.len();
    if n_rows < MINIMUM_ROWS {
        return Err(DataError::InsufficientRows {
            found: n_rows,
            required: MINIMUM_ROWS,
        });
    }

    let n_features = feature_names.len();
    // Row-major by construction: each record appended its features in header order.
    let features = Array2::from_shape_vec((n_rows, n_features), features)?;
    let dataset = Dataset::with_column_names(features, Array1::from(response), feature_names)?;
    log::info!(
        "Loaded {} rows with {} feature columns (response '{}').",
        dataset.n_rows(),
        dataset.n_columns(),
        response_column
    );
    Ok(dataset)
}

fn parse_field(field: &str, column_name: &str, row: usize) -> Result<f64, DataError> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return Err(DataError::MissingValuesFound(column_name.to_string()));
    }
    let value: f64 = trimmed.parse().map_err(|_| DataError::NonNumericValue {
        column_name: column_name.to_string(),
        row,
        value: trimmed.to_string(),
    })?;
    if !value.is_finite() {
        return Err(DataError::NonFiniteValuesFound(column_name.to_string()));
    }
    Ok(value)
}
