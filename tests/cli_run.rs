use std::fs;
use std::process::Command;

use lassoboot::config::BootstrapConfig;
use lassoboot::export::load_json;
use tempfile::tempdir;

fn write_training_data(path: &std::path::Path) {
    let mut data = String::from("x1\tx2\ty\n");
    for i in 0..20 {
        let x1 = i as f64 / 4.0;
        let x2 = ((i * 7) % 5) as f64 - 2.0;
        let y = 1.5 * x1 - 0.5 * x2 + if i % 2 == 0 { 0.2 } else { -0.2 };
        data.push_str(&format!("{x1}\t{x2}\t{y}\n"));
    }
    fs::write(path, data).expect("write training data");
}

#[test]
fn run_writes_iteration_table_and_json() {
    let tmp = tempdir().expect("temporary directory");
    let data_path = tmp.path().join("train.tsv");
    write_training_data(&data_path);

    let exe = env!("CARGO_BIN_EXE_lassoboot");
    let status = Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "run",
            data_path.to_str().expect("path str"),
            "--iterations",
            "15",
            "--alpha",
            "0.05",
            "--seed",
            "42",
            "--json",
            "result.json",
            "--summary",
            "summary.tsv",
        ])
        .status()
        .expect("run lassoboot cli");

    assert!(status.success(), "CLI exited with status {status:?}");
    let table = fs::read_to_string(tmp.path().join("iterations.tsv")).expect("iterations.tsv");
    assert_eq!(table.lines().count(), 16);
    assert!(table.starts_with("iteration\tstatus\tintercept\tcoef_x1\tcoef_x2\t"));

    let result = load_json(tmp.path().join("result.json")).expect("result.json");
    assert_eq!(result.len(), 15);
    assert_eq!(result.config.seed, Some(42));
    assert_eq!(result.column_names, vec!["x1", "x2"]);

    let summary = fs::read_to_string(tmp.path().join("summary.tsv")).expect("summary.tsv");
    assert_eq!(summary.lines().count(), 3);
}

#[test]
fn init_config_writes_a_loadable_default() {
    let tmp = tempdir().expect("temporary directory");
    let exe = env!("CARGO_BIN_EXE_lassoboot");
    let status = Command::new(exe)
        .current_dir(tmp.path())
        .args(["init-config", "--output", "defaults.toml"])
        .status()
        .expect("run lassoboot cli");

    assert!(status.success(), "CLI exited with status {status:?}");
    let config = BootstrapConfig::load(tmp.path().join("defaults.toml")).expect("load config");
    assert_eq!(config, BootstrapConfig::default());
}

#[test]
fn missing_response_column_fails_with_nonzero_status() {
    let tmp = tempdir().expect("temporary directory");
    let data_path = tmp.path().join("train.tsv");
    write_training_data(&data_path);

    let exe = env!("CARGO_BIN_EXE_lassoboot");
    let output = Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "run",
            data_path.to_str().expect("path str"),
            "--response",
            "phenotype",
            "--iterations",
            "3",
        ])
        .output()
        .expect("run lassoboot cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("phenotype"), "unexpected stderr: {stderr}");
}

#[test]
fn invalid_confidence_level_fails_before_any_output() {
    let tmp = tempdir().expect("temporary directory");
    let data_path = tmp.path().join("train.tsv");
    write_training_data(&data_path);

    let exe = env!("CARGO_BIN_EXE_lassoboot");
    let output = Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "run",
            data_path.to_str().expect("path str"),
            "--iterations",
            "50",
            "--seed",
            "1",
            "--confidence",
            "1.5",
        ])
        .output()
        .expect("run lassoboot cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1.5"), "unexpected stderr: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Completed"), "bootstrap ran: {stdout}");
    assert!(!tmp.path().join("iterations.tsv").exists());
}
