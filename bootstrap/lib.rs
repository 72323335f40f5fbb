#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod config;
pub mod data;
pub mod driver;
pub mod export;
pub mod fit;
pub mod progress;
pub mod resample;
pub mod solver;
pub mod summary;
pub mod types;

pub use config::{BootstrapConfig, ConfigurationError, LassoParams};
pub use driver::{BootstrapError, BootstrapRun, run_bootstrap, run_bootstrap_with_progress};
pub use solver::{CoordinateDescentLasso, PenalizedFit, PenalizedRegression, SolverError};
pub use types::{
    BootstrapResult, BootstrapSampleSpec, ColumnSelection, Dataset, IterationResult,
    IterationStatus,
};
