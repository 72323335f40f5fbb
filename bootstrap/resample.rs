//! # Bootstrap Resampling
//!
//! Draws the row and column indices that define one bootstrap resample and
//! materializes the resampled design by index lookup into the dataset.
//!
//! - Rows are drawn uniformly with replacement, `n_rows` of them, which is the
//!   classical nonparametric bootstrap.
//! - Columns, when sampled, are drawn uniformly *without* replacement and kept
//!   in ascending order. A resample therefore never contains a duplicated
//!   column, and positions map one-to-one onto original column indices.
//! - All randomness comes from the generator handle passed in. The driver
//!   derives one generator per iteration with [`iteration_rng`], so the draws
//!   of iteration `i` depend only on the master seed and `i`.

use crate::config::ConfigurationError;
use crate::types::{BootstrapSampleSpec, ColumnSelection, Dataset};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

/// Generator for iteration `iteration` of a run seeded with `seed`.
///
/// The two values are mixed with SplitMix64 so that neighbouring iterations
/// get unrelated streams.
pub fn iteration_rng(seed: u64, iteration: usize) -> StdRng {
    let mixed = splitmix64(seed ^ splitmix64(iteration as u64));
    StdRng::seed_from_u64(mixed)
}

fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draws `n_rows` row indices uniformly with replacement from `[0, n_rows)`.
pub fn draw_rows<R: Rng>(
    rng: &mut R,
    n_rows: usize,
) -> Result<Vec<usize>, ConfigurationError> {
    if n_rows == 0 {
        return Err(ConfigurationError::NoRowsToDraw);
    }
    Ok((0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect())
}

/// Draws the column selection for one iteration.
///
/// `column_sample_size` of `None` means column sampling is off and every
/// column is used in original order.
pub fn draw_columns<R: Rng>(
    rng: &mut R,
    n_columns: usize,
    column_sample_size: Option<usize>,
) -> Result<ColumnSelection, ConfigurationError> {
    let Some(size) = column_sample_size else {
        return Ok(ColumnSelection::All);
    };
    if size == 0 {
        return Err(ConfigurationError::ZeroColumnSampleSize);
    }
    if size > n_columns {
        return Err(ConfigurationError::ColumnSampleSizeTooLarge {
            requested: size,
            available: n_columns,
        });
    }
    let mut columns = index::sample(rng, n_columns, size).into_vec();
    columns.sort_unstable();
    Ok(ColumnSelection::Sampled(columns))
}

/// Draws a complete sample spec: rows first, then columns, from the same generator.
pub fn draw<R: Rng>(
    rng: &mut R,
    n_rows: usize,
    n_columns: usize,
    column_sample_size: Option<usize>,
) -> Result<BootstrapSampleSpec, ConfigurationError> {
    if n_columns == 0 {
        return Err(ConfigurationError::EmptyDataset {
            rows: n_rows,
            columns: 0,
        });
    }
    let row_indices = draw_rows(rng, n_rows)?;
    let column_indices = draw_columns(rng, n_columns, column_sample_size)?;
    Ok(BootstrapSampleSpec {
        row_indices,
        column_indices,
    })
}

/// Builds the resampled feature matrix and response vector. The dataset is
/// only read.
pub fn build_resample(dataset: &Dataset, spec: &BootstrapSampleSpec) -> (Array2<f64>, Array1<f64>) {
    let rows = dataset.features().select(Axis(0), &spec.row_indices);
    let x = match &spec.column_indices {
        ColumnSelection::All => rows,
        ColumnSelection::Sampled(columns) => rows.select(Axis(1), columns),
    };
    let y = dataset.response().select(Axis(0), &spec.row_indices);
    (x, y)
}
