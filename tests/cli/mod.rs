//! Integration tests running the actual crate binary against a temporary output root.
//! Test the full E2E path.

use std::{
    path::Path,
    process::{Command, Output},
};

use crate::read_tree;

fn run_binary(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_settlement-fixtures"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute binary")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("binary output was not valid UTF-8")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp dir path is UTF-8")
}

#[test]
fn range_run_prints_summaries_and_totals() {
    let root = tempfile::tempdir().unwrap();
    let output = run_binary(&[
        "--start-epoch",
        "10",
        "--end-epoch",
        "12",
        "--output-root",
        path_arg(root.path()),
    ]);
    let stdout = stdout_of(&output);
    let lines: Vec<_> = stdout.lines().collect();

    assert_eq!(
        lines[0],
        "Generating fabricated test data for 3 epoch(s): 10..12"
    );
    assert_eq!(lines[1], format!("Output root: {}", root.path().display()));
    assert_eq!(lines[2], "");
    for (line, epoch) in lines[3..6].iter().zip(10..) {
        assert!(
            line.starts_with(&format!("  epoch {epoch}: ")),
            "unexpected summary line {line:?}"
        );
        assert!(line.contains(" validators ("));
    }
    assert_eq!(lines[6], "");
    assert_eq!(lines[7], "Generated 3 epoch(s) of fabricated input data.");
    assert!(lines[8].starts_with("Total validators across all epochs: "));

    for epoch in 10..=12 {
        assert!(
            root.path()
                .join(epoch.to_string())
                .join("inputs/stakes.json")
                .is_file()
        );
    }
}

#[test]
fn single_epoch_run_omits_totals() {
    let root = tempfile::tempdir().unwrap();
    let output = run_binary(&["--epoch", "99999", "--output-root", path_arg(root.path())]);
    let stdout = stdout_of(&output);

    assert!(stdout.contains(
        "  epoch 99999: 5 validators (1 SAM-only, 1 SAM+downtime, 1 SAM+commission, 1 passive, 1 institutional)"
    ));
    assert!(stdout.contains("Generated 1 epoch(s) of fabricated input data."));
    assert!(!stdout.contains("Total validators"));
}

#[test]
fn legacy_output_dir_writes_below_its_grandparent() {
    let root = tempfile::tempdir().unwrap();
    let legacy = root.path().join("99999").join("inputs");
    let output = run_binary(&["--output-dir", path_arg(&legacy)]);
    stdout_of(&output);

    assert!(legacy.join("validators.json").is_file());
    assert!(legacy.join("institutional/institutional-payouts.json").is_file());
}

#[test]
fn workers_do_not_change_the_output() {
    let sequential = tempfile::tempdir().unwrap();
    let parallel = tempfile::tempdir().unwrap();
    let range = ["--start-epoch", "300", "--end-epoch", "307"];

    let mut args = range.to_vec();
    args.extend(["--output-root", path_arg(sequential.path())]);
    let sequential_stdout = stdout_of(&run_binary(&args));

    let mut args = range.to_vec();
    args.extend(["--output-root", path_arg(parallel.path()), "--workers", "3"]);
    let parallel_stdout = stdout_of(&run_binary(&args));

    assert_eq!(read_tree(sequential.path()), read_tree(parallel.path()));
    let summaries = |stdout: &str| -> Vec<String> {
        stdout
            .lines()
            .filter(|l| l.starts_with("  epoch"))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(summaries(&sequential_stdout), summaries(&parallel_stdout));
}

#[test]
fn config_file_overrides_constants() {
    let root = tempfile::tempdir().unwrap();
    let config = root.path().join("fixtures.json");
    std::fs::write(&config, r#"{"expected_credits": 432000}"#).unwrap();
    let out = root.path().join("out");

    let output = run_binary(&[
        "--epoch",
        "99999",
        "--output-root",
        path_arg(&out),
        "--config",
        path_arg(&config),
    ]);
    stdout_of(&output);

    let validators: serde_json::Value = serde_json::from_slice(
        &std::fs::read(out.join("99999/inputs/validators.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(validators["validator_metas"][0]["credits"], 432_000);
    assert_eq!(validators["validator_metas"][1]["credits"], 319_680);
}

#[test]
fn conflicting_selection_fails() {
    let root = tempfile::tempdir().unwrap();
    let output = run_binary(&[
        "--epoch",
        "1",
        "--start-epoch",
        "2",
        "--output-root",
        path_arg(root.path()),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--epoch cannot be combined"));
    assert!(read_tree(root.path()).is_empty());
}

#[test]
fn reversed_range_fails() {
    let root = tempfile::tempdir().unwrap();
    let output = run_binary(&[
        "--start-epoch",
        "9",
        "--end-epoch",
        "3",
        "--output-root",
        path_arg(root.path()),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid epoch range"));
}

#[test]
fn invalid_config_fails() {
    let root = tempfile::tempdir().unwrap();
    let config = root.path().join("bad.json");
    std::fs::write(&config, r#"{"whitelist_stake_authorities": []}"#).unwrap();

    let output = run_binary(&[
        "--config",
        path_arg(&config),
        "--output-root",
        path_arg(root.path()),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid fixture config"));
}
