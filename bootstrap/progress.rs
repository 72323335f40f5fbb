use crate::types::IterationResult;

/// Observer for reporting incremental progress while the bootstrap runs.
pub trait BootstrapProgressObserver {
    fn on_run_start(&mut self, total_iterations: usize) {
        let _ = total_iterations;
    }
    fn on_iteration_finish(&mut self, result: &IterationResult) {
        let _ = result;
    }
    fn on_run_finish(&mut self, failed_iterations: usize) {
        let _ = failed_iterations;
    }
}

#[derive(Default)]
pub struct NoopBootstrapProgress;

impl BootstrapProgressObserver for NoopBootstrapProgress {}
