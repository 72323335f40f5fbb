//! Run configuration: how many resamples to draw, how to sample columns, and
//! the regularization settings passed through to the solver untouched.
//!
//! Configurations are plain serde structs so they can be echoed into a
//! `BootstrapResult` and written to or read from TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Regularization settings for the penalized regression solver.
///
/// The objective minimized by the bundled solver is
/// `(1 / 2n) * ||y - Xb - b0||^2 + alpha * ||b||_1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LassoParams {
    /// L1 penalty strength. Must be finite and non-negative.
    pub alpha: f64,
    /// Fit an unpenalized intercept by centering the resample.
    pub fit_intercept: bool,
    /// Maximum number of full coordinate sweeps.
    pub max_iterations: usize,
    /// Sweep stops once the largest coefficient change falls below this.
    pub tolerance: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fit_intercept: true,
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

/// The full set of options recognized by a bootstrap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub n_iterations: usize,
    /// Draw a column subset for each iteration.
    pub sample_columns: bool,
    /// Size of the column subset. Defaults to every column when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_sample_size: Option<usize>,
    /// Master seed. A fresh one is drawn and recorded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub lasso: LassoParams,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_iterations: 1000,
            sample_columns: false,
            column_sample_size: None,
            seed: None,
            lasso: LassoParams::default(),
        }
    }
}

/// Fatal problems detected before any iteration runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("The number of bootstrap iterations must be positive.")]
    ZeroIterations,
    #[error("The dataset is empty ({rows} rows, {columns} columns); nothing can be resampled.")]
    EmptyDataset { rows: usize, columns: usize },
    #[error("Row resampling needs at least one row to draw from.")]
    NoRowsToDraw,
    #[error("The regularization strength alpha must be finite and non-negative, got {0}.")]
    InvalidAlpha(f64),
    #[error("The solver tolerance must be finite and positive, got {0}.")]
    InvalidTolerance(f64),
    #[error("The solver iteration limit must be positive.")]
    ZeroSolverIterations,
    #[error("The column sample size must be positive.")]
    ZeroColumnSampleSize,
    #[error(
        "A column sample size of {requested} exceeds the {available} available columns (columns are drawn without replacement)."
    )]
    ColumnSampleSizeTooLarge { requested: usize, available: usize },
    #[error("The seed {0} does not fit in a TOML integer; seeds must not exceed {max}.", max = i64::MAX)]
    SeedOutOfRange(u64),
}

/// Failures reading or writing a configuration file.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read or write configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

impl LassoParams {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }

    /// Checks the ranges the driver depends on. Deeper checks are the solver's job.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ConfigurationError::InvalidAlpha(self.alpha));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigurationError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(ConfigurationError::ZeroSolverIterations);
        }
        Ok(())
    }
}

impl BootstrapConfig {
    pub fn new(n_iterations: usize, lasso: LassoParams) -> Self {
        Self {
            n_iterations,
            lasso,
            ..Self::default()
        }
    }

    pub fn with_column_sampling(mut self, column_sample_size: Option<usize>) -> Self {
        self.sample_columns = true;
        self.column_sample_size = column_sample_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates everything that can be checked without a dataset.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.n_iterations == 0 {
            return Err(ConfigurationError::ZeroIterations);
        }
        self.lasso.validate()?;
        if self.sample_columns && self.column_sample_size == Some(0) {
            return Err(ConfigurationError::ZeroColumnSampleSize);
        }
        if let Some(seed) = self.seed.filter(|&seed| seed > i64::MAX as u64) {
            return Err(ConfigurationError::SeedOutOfRange(seed));
        }
        Ok(())
    }

    /// Number of columns each iteration will fit on, or `None` when column
    /// sampling is off.
    pub fn resolved_column_sample_size(
        &self,
        n_columns: usize,
    ) -> Result<Option<usize>, ConfigurationError> {
        if !self.sample_columns {
            return Ok(None);
        }
        let size = self.column_sample_size.unwrap_or(n_columns);
        if size == 0 {
            return Err(ConfigurationError::ZeroColumnSampleSize);
        }
        if size > n_columns {
            return Err(ConfigurationError::ColumnSampleSizeTooLarge {
                requested: size,
                available: n_columns,
            });
        }
        Ok(Some(size))
    }

    /// Saves the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigFileError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads a configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let toml_string = fs::read_to_string(path)?;
        let config = toml::from_str(&toml_string)?;
        Ok(config)
    }
}
