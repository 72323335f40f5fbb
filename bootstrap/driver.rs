//! # Bootstrap Driver
//!
//! Orchestrates `n_iterations` rounds of resample, fit and record.
//!
//! A run moves through three states. `BootstrapRun::new` is `INIT`: it
//! validates the configuration against the dataset and is the only place a
//! `ConfigurationError` can come from. Each call to `step` performs one
//! complete iteration (`ITERATING`). Once every iteration is recorded the run
//! is `DONE` and `finish` hands the result to the caller.
//!
//! A failed fit is recorded and the run moves on. Only an `AlignmentError`
//! aborts a run that has started. Dropping a run between steps abandons it
//! cleanly, since no partial iteration state is ever kept.

use crate::config::{BootstrapConfig, ConfigurationError};
use crate::fit::{AlignmentError, FitOutcome, fit_and_align};
use crate::progress::{BootstrapProgressObserver, NoopBootstrapProgress};
use crate::resample::{build_resample, draw, iteration_rng};
use crate::solver::PenalizedRegression;
use crate::types::{BootstrapResult, Dataset, IterationResult, IterationStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that abort a bootstrap run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BootstrapError {
    #[error("Invalid bootstrap configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Internal coefficient alignment failure: {0}")]
    Alignment(#[from] AlignmentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Iterating { next: usize },
    Done,
}

/// An in-progress bootstrap run over a borrowed dataset and solver.
pub struct BootstrapRun<'a, S: PenalizedRegression + ?Sized> {
    dataset: &'a Dataset,
    solver: &'a S,
    config: BootstrapConfig,
    seed: u64,
    column_sample_size: Option<usize>,
    iterations: Vec<IterationResult>,
    state: RunState,
}

impl<'a, S: PenalizedRegression + ?Sized> BootstrapRun<'a, S> {
    /// Validates the configuration and prepares the run.
    pub fn new(
        dataset: &'a Dataset,
        config: &BootstrapConfig,
        solver: &'a S,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if dataset.is_empty() {
            return Err(ConfigurationError::EmptyDataset {
                rows: dataset.n_rows(),
                columns: dataset.n_columns(),
            });
        }
        let column_sample_size = config.resolved_column_sample_size(dataset.n_columns())?;
        if !config.sample_columns && config.column_sample_size.is_some() {
            log::warn!(
                "column_sample_size is set but column sampling is disabled; every column will be used."
            );
        }

        // Seeds stay within i64 range so the echoed configuration survives TOML.
        let seed = config.seed.unwrap_or_else(|| rand::random::<u64>() >> 1);
        let mut echoed = config.clone();
        echoed.seed = Some(seed);

        log::info!(
            "Starting bootstrap: {} iterations over {} rows x {} columns (alpha = {}, column sample size = {}, seed = {}).",
            config.n_iterations,
            dataset.n_rows(),
            dataset.n_columns(),
            config.lasso.alpha,
            column_sample_size.map_or_else(|| "all".to_string(), |k| k.to_string()),
            seed
        );

        Ok(Self {
            dataset,
            solver,
            iterations: Vec::with_capacity(config.n_iterations),
            config: echoed,
            seed,
            column_sample_size,
            state: RunState::Iterating { next: 0 },
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }

    /// Runs the next iteration. Returns `Ok(None)` once the run is done.
    pub fn step(&mut self) -> Result<Option<&IterationResult>, BootstrapError> {
        let RunState::Iterating { next } = self.state else {
            return Ok(None);
        };

        let result = self.run_iteration(next)?;
        self.iterations.push(result);
        self.state = if next + 1 == self.config.n_iterations {
            RunState::Done
        } else {
            RunState::Iterating { next: next + 1 }
        };
        Ok(self.iterations.last())
    }

    fn run_iteration(&self, iteration: usize) -> Result<IterationResult, BootstrapError> {
        let n_rows = self.dataset.n_rows();
        let n_columns = self.dataset.n_columns();
        let mut rng = iteration_rng(self.seed, iteration);
        let sample_spec = draw(&mut rng, n_rows, n_columns, self.column_sample_size)?;
        let (x, y) = build_resample(self.dataset, &sample_spec);

        let outcome = fit_and_align(
            self.solver,
            x.view(),
            y.view(),
            &self.config.lasso,
            &sample_spec.column_indices,
            n_columns,
            iteration,
        )?;

        let result = match outcome {
            FitOutcome::Success {
                coefficients,
                intercept,
                solver_iterations,
            } => {
                log::debug!(
                    "Iteration {iteration}: converged after {solver_iterations} sweeps, {} nonzero coefficients.",
                    coefficients.values().filter(|&&b| b != 0.0).count()
                );
                IterationResult {
                    iteration_index: iteration,
                    coefficients,
                    intercept: Some(intercept),
                    solver_iterations: Some(solver_iterations),
                    sample_spec,
                    status: IterationStatus::Success,
                    error_detail: None,
                }
            }
            FitOutcome::Failure(detail) => {
                log::warn!("Iteration {iteration} failed: {detail}");
                IterationResult {
                    iteration_index: iteration,
                    coefficients: BTreeMap::new(),
                    intercept: None,
                    solver_iterations: None,
                    sample_spec,
                    status: IterationStatus::Failure,
                    error_detail: Some(detail),
                }
            }
        };
        Ok(result)
    }

    /// Runs any remaining iterations and returns the completed result.
    pub fn finish(mut self) -> Result<BootstrapResult, BootstrapError> {
        while self.step()?.is_some() {}
        Ok(self.into_result())
    }

    fn into_result(self) -> BootstrapResult {
        let result = BootstrapResult {
            iterations: self.iterations,
            config: self.config,
            n_rows: self.dataset.n_rows(),
            n_columns: self.dataset.n_columns(),
            column_names: self.dataset.column_names().to_vec(),
        };
        log::info!(
            "Bootstrap finished: {} of {} iterations succeeded ({} failed).",
            result.n_successful(),
            result.len(),
            result.n_failed()
        );
        result
    }
}

/// Runs a complete bootstrap.
pub fn run_bootstrap<S: PenalizedRegression + ?Sized>(
    dataset: &Dataset,
    config: &BootstrapConfig,
    solver: &S,
) -> Result<BootstrapResult, BootstrapError> {
    run_bootstrap_with_progress(dataset, config, solver, &mut NoopBootstrapProgress)
}

/// Runs a complete bootstrap, reporting each recorded iteration to `progress`.
pub fn run_bootstrap_with_progress<S, P>(
    dataset: &Dataset,
    config: &BootstrapConfig,
    solver: &S,
    progress: &mut P,
) -> Result<BootstrapResult, BootstrapError>
where
    S: PenalizedRegression + ?Sized,
    P: BootstrapProgressObserver + ?Sized,
{
    let mut run = BootstrapRun::new(dataset, config, solver)?;
    progress.on_run_start(config.n_iterations);
    while let Some(result) = run.step()? {
        progress.on_iteration_finish(result);
    }
    let result = run.into_result();
    progress.on_run_finish(result.n_failed());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LassoParams;
    use crate::solver::{CoordinateDescentLasso, PenalizedFit, SolverError};
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
    use std::cell::Cell;

    fn small_dataset() -> Dataset {
        let features = Array2::from_shape_fn((12, 2), |(i, j)| (i as f64 + 1.0).powi(j as i32 + 1));
        let response = Array1::from_shape_fn(12, |i| 0.5 * i as f64 + (i % 3) as f64);
        Dataset::new(features, response).unwrap()
    }

    /// Fails every third call and succeeds otherwise.
    struct FlakySolver {
        calls: Cell<usize>,
    }

    impl PenalizedRegression for FlakySolver {
        fn fit(
            &self,
            x: ArrayView2<f64>,
            _: ArrayView1<f64>,
            _: &LassoParams,
        ) -> Result<PenalizedFit, SolverError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call % 3 == 2 {
                return Err(SolverError::IllConditioned("flaky".to_string()));
            }
            Ok(PenalizedFit {
                coefficients: Array1::zeros(x.ncols()),
                intercept: 0.0,
                iterations: 1,
            })
        }
    }

    struct ShortSolver;

    impl PenalizedRegression for ShortSolver {
        fn fit(
            &self,
            _: ArrayView2<f64>,
            _: ArrayView1<f64>,
            _: &LassoParams,
        ) -> Result<PenalizedFit, SolverError> {
            Ok(PenalizedFit {
                coefficients: Array1::zeros(1),
                intercept: 0.0,
                iterations: 1,
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Option<usize>,
        seen: Vec<usize>,
        failed: Option<usize>,
    }

    impl BootstrapProgressObserver for RecordingProgress {
        fn on_run_start(&mut self, total_iterations: usize) {
            self.started = Some(total_iterations);
        }
        fn on_iteration_finish(&mut self, result: &IterationResult) {
            self.seen.push(result.iteration_index);
        }
        fn on_run_finish(&mut self, failed_iterations: usize) {
            self.failed = Some(failed_iterations);
        }
    }

    #[test]
    fn state_machine_advances_to_done() {
        let dataset = small_dataset();
        let config = BootstrapConfig::new(3, LassoParams::new(0.1)).with_seed(1);
        let solver = CoordinateDescentLasso::new();
        let mut run = BootstrapRun::new(&dataset, &config, &solver).unwrap();

        assert_eq!(run.state(), RunState::Iterating { next: 0 });
        assert_eq!(run.step().unwrap().map(|r| r.iteration_index), Some(0));
        assert_eq!(run.state(), RunState::Iterating { next: 1 });
        run.step().unwrap();
        run.step().unwrap();
        assert!(run.is_done());
        assert!(run.step().unwrap().is_none());
        assert_eq!(run.finish().unwrap().len(), 3);
    }

    #[test]
    fn failed_iterations_are_recorded_and_the_run_continues() {
        let dataset = small_dataset();
        let config = BootstrapConfig::new(9, LassoParams::new(0.1)).with_seed(2);
        let solver = FlakySolver {
            calls: Cell::new(0),
        };
        let result = run_bootstrap(&dataset, &config, &solver).unwrap();

        assert_eq!(result.len(), 9);
        assert_eq!(result.n_failed(), 3);
        assert!((result.failure_rate() - 1.0 / 3.0).abs() < 1e-12);
        for failed in result.failed() {
            assert_eq!(failed.iteration_index % 3, 2);
            assert!(failed.coefficients.is_empty());
            assert!(failed.error_detail.as_deref().unwrap().contains("flaky"));
        }
    }

    #[test]
    fn alignment_errors_abort_the_run_with_the_iteration_index() {
        let dataset = small_dataset();
        let config = BootstrapConfig::new(5, LassoParams::new(0.1)).with_seed(3);
        let err = run_bootstrap(&dataset, &config, &ShortSolver).unwrap_err();
        assert_eq!(
            err,
            BootstrapError::Alignment(AlignmentError::LengthMismatch {
                iteration: 0,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn configuration_errors_surface_before_any_iteration() {
        let dataset = small_dataset();
        let solver = CoordinateDescentLasso::new();

        let zero = BootstrapConfig::new(0, LassoParams::new(0.1));
        assert!(matches!(
            run_bootstrap(&dataset, &zero, &solver),
            Err(BootstrapError::Configuration(ConfigurationError::ZeroIterations))
        ));

        let too_many_columns =
            BootstrapConfig::new(5, LassoParams::new(0.1)).with_column_sampling(Some(3));
        assert!(matches!(
            run_bootstrap(&dataset, &too_many_columns, &solver),
            Err(BootstrapError::Configuration(
                ConfigurationError::ColumnSampleSizeTooLarge { .. }
            ))
        ));

        let empty = Dataset::new(Array2::zeros((0, 2)), Array1::zeros(0)).unwrap();
        let config = BootstrapConfig::new(5, LassoParams::new(0.1));
        assert!(matches!(
            run_bootstrap(&empty, &config, &solver),
            Err(BootstrapError::Configuration(
                ConfigurationError::EmptyDataset { rows: 0, .. }
            ))
        ));
    }

    #[test]
    fn resolved_seed_is_echoed() {
        let dataset = small_dataset();
        let solver = CoordinateDescentLasso::new();
        let config = BootstrapConfig::new(2, LassoParams::new(0.1));
        let result = run_bootstrap(&dataset, &config, &solver).unwrap();
        let seed = result.config.seed.expect("seed should be recorded");
        assert!(seed <= i64::MAX as u64);

        let replay = run_bootstrap(&dataset, &config.clone().with_seed(seed), &solver).unwrap();
        assert_eq!(replay.iterations, result.iterations);
    }

    #[test]
    fn progress_observer_sees_every_iteration() {
        let dataset = small_dataset();
        let solver = FlakySolver {
            calls: Cell::new(0),
        };
        let config = BootstrapConfig::new(6, LassoParams::new(0.1)).with_seed(4);
        let mut progress = RecordingProgress::default();
        run_bootstrap_with_progress(&dataset, &config, &solver, &mut progress).unwrap();

        assert_eq!(progress.started, Some(6));
        assert_eq!(progress.seen, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(progress.failed, Some(2));
    }
}
