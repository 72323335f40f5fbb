//! Writers for finished runs: one TSV row per iteration, the whole result as
//! JSON, and the per-column summary as TSV.

use crate::summary::BootstrapSummary;
use crate::types::BootstrapResult;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write output file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to write tab-separated output: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Failed to serialize result to JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one row per iteration: status, intercept, one coefficient column
/// per original feature, then the indices used and any error detail.
pub fn write_iterations<W: Write>(result: &BootstrapResult, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);

    let mut header = vec![
        "iteration".to_string(),
        "status".to_string(),
        "intercept".to_string(),
    ];
    header.extend(result.column_names.iter().map(|name| format!("coef_{name}")));
    header.extend(["row_indices", "column_indices", "error"].map(String::from));
    writer.write_record(&header)?;

    for iteration in &result.iterations {
        let mut record = vec![
            iteration.iteration_index.to_string(),
            iteration.status.as_str().to_string(),
            format_optional(iteration.intercept),
        ];
        record.extend(
            (0..result.n_columns)
                .map(|column| format_optional(iteration.coefficients.get(&column).copied())),
        );
        record.push(iteration.sample_spec.row_indices.iter().join(","));
        record.push(
            iteration
                .sample_spec
                .column_indices
                .to_indices(result.n_columns)
                .iter()
                .join(","),
        );
        record.push(iteration.error_detail.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_iterations(result: &BootstrapResult, path: impl AsRef<Path>) -> Result<(), ExportError> {
    write_iterations(result, BufWriter::new(File::create(path)?))
}

pub fn save_json(result: &BootstrapResult, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut file, result)?;
    file.flush()?;
    Ok(())
}

pub fn load_json(path: impl AsRef<Path>) -> Result<BootstrapResult, ExportError> {
    let file = std::io::BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(file)?)
}

pub fn write_summary<W: Write>(summary: &BootstrapSummary, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    writer.write_record([
        "column",
        "name",
        "n_included",
        "mean",
        "std_error",
        "ci_lower",
        "ci_upper",
        "selection_frequency",
    ])?;
    for column in &summary.columns {
        writer.write_record([
            column.column_index.to_string(),
            column.column_name.clone(),
            column.n_included.to_string(),
            format_optional(column.mean),
            format_optional(column.std_error),
            format_optional(column.ci_lower),
            format_optional(column.ci_upper),
            format_optional(column.selection_frequency),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summary(summary: &BootstrapSummary, path: impl AsRef<Path>) -> Result<(), ExportError> {
    write_summary(summary, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BootstrapConfig, LassoParams};
    use crate::summary::summarize;
    use crate::types::{BootstrapSampleSpec, ColumnSelection, IterationResult, IterationStatus};
    use std::collections::BTreeMap;

    fn sample_result() -> BootstrapResult {
        BootstrapResult {
            iterations: vec![
                IterationResult {
                    iteration_index: 0,
                    coefficients: BTreeMap::from([(0, 1.5), (2, -0.25)]),
                    intercept: Some(0.5),
                    solver_iterations: Some(4),
                    sample_spec: BootstrapSampleSpec {
                        row_indices: vec![1, 1, 0],
                        column_indices: ColumnSelection::Sampled(vec![0, 2]),
                    },
                    status: IterationStatus::Success,
                    error_detail: None,
                },
                IterationResult {
                    iteration_index: 1,
                    coefficients: BTreeMap::new(),
                    intercept: None,
                    solver_iterations: None,
                    sample_spec: BootstrapSampleSpec {
                        row_indices: vec![2, 0, 2],
                        column_indices: ColumnSelection::Sampled(vec![1, 2]),
                    },
                    status: IterationStatus::Failure,
                    error_detail: Some("did not converge".to_string()),
                },
            ],
            config: BootstrapConfig::new(2, LassoParams::new(0.1))
                .with_column_sampling(Some(2))
                .with_seed(5),
            n_rows: 3,
            n_columns: 3,
            column_names: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    #[test]
    fn iteration_table_has_one_row_per_iteration() {
        let mut buffer = Vec::new();
        write_iterations(&sample_result(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "iteration\tstatus\tintercept\tcoef_a\tcoef_b\tcoef_c\trow_indices\tcolumn_indices\terror"
        );
        assert_eq!(lines[1], "0\tsuccess\t0.5\t1.5\t\t-0.25\t1,1,0\t0,2\t");
        assert_eq!(lines[2], "1\tfailure\t\t\t\t\t2,0,2\t1,2\tdid not converge");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_round_trip_preserves_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let result = sample_result();
        save_json(&result, &path).unwrap();
        assert_eq!(load_json(&path).unwrap(), result);
    }

    #[test]
    fn summary_table_lists_every_column() {
        let summary = summarize(&sample_result(), 0.95).unwrap();
        let mut buffer = Vec::new();
        write_summary(&summary, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0\ta\t1\t1.5\t"));
        assert!(lines[2].starts_with("1\tb\t0\t\t"));
    }
}
