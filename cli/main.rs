#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;

use lassoboot::config::BootstrapConfig;
use lassoboot::data::load_dataset;
use lassoboot::driver::run_bootstrap_with_progress;
use lassoboot::export::{save_iterations, save_json, save_summary};
use lassoboot::progress::BootstrapProgressObserver;
use lassoboot::solver::CoordinateDescentLasso;
use lassoboot::summary::{summarize, validate_confidence_level};
use lassoboot::types::IterationResult;

#[derive(Parser)]
#[command(
    name = "lassoboot",
    about = "Bootstrap the sampling variability of Lasso coefficients",
    long_about = "Repeatedly resamples a dataset with replacement, refits a Lasso regression on each \
                  resample, and reports the per-iteration coefficients and their bootstrap summary."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap on a TSV dataset
    #[command(about = "Run the bootstrap (outputs: iterations.tsv)")]
    Run(RunArgs),

    /// Write the default configuration to a TOML file
    InitConfig {
        #[arg(long, default_value = "bootstrap.toml")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TSV file with a header row
    data: PathBuf,

    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the response column
    #[arg(long, default_value = "y")]
    response: String,

    /// Number of bootstrap iterations
    #[arg(long, value_name = "N")]
    iterations: Option<usize>,

    /// L1 regularization strength
    #[arg(long)]
    alpha: Option<f64>,

    /// Draw a column subset for every iteration
    #[arg(long)]
    sample_columns: bool,

    /// Number of columns drawn per iteration (implies --sample-columns)
    #[arg(long, value_name = "K")]
    column_sample_size: Option<usize>,

    /// Master seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Fit without an intercept
    #[arg(long)]
    no_intercept: bool,

    /// Maximum coordinate descent sweeps per fit
    #[arg(long)]
    max_solver_iterations: Option<usize>,

    /// Convergence tolerance for coordinate descent
    #[arg(long)]
    tolerance: Option<f64>,

    /// Per-iteration output table
    #[arg(long, default_value = "iterations.tsv")]
    output: PathBuf,

    /// Also write the full result as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write the per-column summary table
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Confidence level for the percentile intervals
    #[arg(long, default_value = "0.95")]
    confidence: f64,
}

impl RunArgs {
    fn resolve_config(&self) -> Result<BootstrapConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => BootstrapConfig::load(path)?,
            None => BootstrapConfig::default(),
        };
        if let Some(n) = self.iterations {
            config.n_iterations = n;
        }
        if let Some(alpha) = self.alpha {
            config.lasso.alpha = alpha;
        }
        if self.sample_columns || self.column_sample_size.is_some() {
            config.sample_columns = true;
        }
        if self.column_sample_size.is_some() {
            config.column_sample_size = self.column_sample_size;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_intercept {
            config.lasso.fit_intercept = false;
        }
        if let Some(max) = self.max_solver_iterations {
            config.lasso.max_iterations = max;
        }
        if let Some(tolerance) = self.tolerance {
            config.lasso.tolerance = tolerance;
        }
        Ok(config)
    }
}

/// Drives an `indicatif` bar from bootstrap progress callbacks.
struct BarProgress {
    bar: Option<ProgressBar>,
    failed: u64,
}

impl BarProgress {
    fn new() -> Self {
        Self {
            bar: None,
            failed: 0,
        }
    }
}

impl BootstrapProgressObserver for BarProgress {
    fn on_run_start(&mut self, total_iterations: usize) {
        let bar = ProgressBar::new(total_iterations as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} iterations {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
        bar.set_style(style);
        self.bar = Some(bar);
    }

    fn on_iteration_finish(&mut self, result: &IterationResult) {
        if !result.is_success() {
            self.failed += 1;
        }
        if let Some(bar) = &self.bar {
            if self.failed > 0 {
                bar.set_message(format!("({} failed)", self.failed));
            }
            bar.inc(1);
        }
    }

    fn on_run_finish(&mut self, failed_iterations: usize) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!("({failed_iterations} failed)"));
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_command(&args),
        Commands::InitConfig { output } => init_config_command(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.resolve_config()?;
    validate_confidence_level(args.confidence)?;

    println!("Loading data from: {}", args.data.display());
    let dataset = load_dataset(&args.data, &args.response)?;
    println!(
        "Loaded {} rows with {} feature columns",
        dataset.n_rows(),
        dataset.n_columns()
    );

    let solver = CoordinateDescentLasso::new();
    let mut progress = BarProgress::new();
    let result = run_bootstrap_with_progress(&dataset, &config, &solver, &mut progress)?;

    if let Some(seed) = result.config.seed {
        println!("Seed: {seed}");
    }
    println!(
        "Completed {} iterations: {} succeeded, {} failed ({:.1}% failure rate)",
        result.len(),
        result.n_successful(),
        result.n_failed(),
        100.0 * result.failure_rate()
    );

    save_iterations(&result, &args.output)?;
    println!("Iterations saved to: {}", args.output.display());

    if let Some(path) = &args.json {
        save_json(&result, path)?;
        println!("Full result saved to: {}", path.display());
    }

    let summary = summarize(&result, args.confidence)?;
    for column in &summary.columns {
        match (column.mean, column.ci_lower, column.ci_upper) {
            (Some(mean), Some(lo), Some(hi)) => println!(
                "  {:<16} mean {:>10.4}  {:.0}% CI [{:.4}, {:.4}]  selected {:.0}%",
                column.column_name,
                mean,
                100.0 * summary.confidence_level,
                lo,
                hi,
                100.0 * column.selection_frequency.unwrap_or(0.0)
            ),
            _ => println!("  {:<16} never fitted", column.column_name),
        }
    }
    if let Some(path) = &args.summary {
        save_summary(&summary, path)?;
        println!("Summary saved to: {}", path.display());
    }

    Ok(())
}

fn init_config_command(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    BootstrapConfig::default().save(output)?;
    println!("Default configuration written to: {}", output.display());
    Ok(())
}
