use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lassoboot::config::{BootstrapConfig, LassoParams};
use lassoboot::driver::run_bootstrap;
use lassoboot::solver::CoordinateDescentLasso;
use lassoboot::types::Dataset;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

const N_ITERATIONS: usize = 100;
const ROW_COUNTS: &[usize] = &[100, 1_000];
const N_COLUMNS: usize = 20;

fn synthetic_dataset(n_rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(0x5EED_B007 + n_rows as u64);
    let features = Array2::from_shape_fn((n_rows, N_COLUMNS), |_| {
        let v: f64 = StandardNormal.sample(&mut rng);
        v
    });
    // Only the first few columns carry signal, so the Lasso has something to zero out.
    let response = Array1::from_shape_fn(n_rows, |i| {
        (0..4).map(|j| features[[i, j]] * (j as f64 + 1.0)).sum::<f64>()
    });
    Dataset::new(features, response).expect("consistent synthetic dataset")
}

fn benchmark_bootstrap_driver(c: &mut Criterion) {
    let solver = CoordinateDescentLasso::new();
    let mut group = c.benchmark_group("Bootstrap driver");
    group.sample_size(10);
    group.throughput(Throughput::Elements(N_ITERATIONS as u64));

    for &n_rows in ROW_COUNTS {
        let dataset = synthetic_dataset(n_rows);
        let all_columns = BootstrapConfig::new(N_ITERATIONS, LassoParams::new(0.05)).with_seed(1);
        let half_columns = all_columns.clone().with_column_sampling(Some(N_COLUMNS / 2));

        group.bench_with_input(
            BenchmarkId::new("All columns", n_rows),
            &dataset,
            |b, data| b.iter(|| run_bootstrap(black_box(data), &all_columns, &solver)),
        );
        group.bench_with_input(
            BenchmarkId::new("Half of the columns", n_rows),
            &dataset,
            |b, data| b.iter(|| run_bootstrap(black_box(data), &half_columns, &solver)),
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_bootstrap_driver);
criterion_main!(benches);
