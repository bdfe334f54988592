use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use cyrisk_model::{Activation, DenseLayer, DenseNetwork, FeatureSchema};
use serde_json::Value as JsonValue;

/// Level 0 of every group pushes every logit up, any other level pushes it down
fn write_model(dir: &Path) -> PathBuf {
    let row: Vec<f64> = FeatureSchema::standard()
        .column_names()
        .iter()
        .map(|name| if name.ends_with("_0") { 0.5 } else { -0.5 })
        .collect();
    let network = DenseNetwork::new(
        "cli-fixture",
        vec![DenseLayer::new(
            vec![row; 5],
            vec![0.0; 5],
            Activation::Identity,
        )],
    )
    .unwrap();
    let path = dir.join("model.json");
    fs::write(&path, serde_json::to_string(&network).unwrap()).unwrap();
    path
}

fn cyrisk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cyrisk"))
        .args(args)
        .env_remove("CYRISK_RISK_THRESHOLD")
        .env_remove("CYRISK_SEED")
        .env_remove("CYRISK_ISOLATED_DELTAS")
        .output()
        .expect("run cyrisk")
}

fn stdout_json(output: &Output) -> JsonValue {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

const ZEROS: [&str; 16] = ["0"; 16];

#[test]
fn predict_prints_assessment() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());
    let mut args = vec!["predict", "--model", model.to_str().unwrap()];
    args.extend(ZEROS);

    let output = cyrisk(&args);
    assert!(output.status.success(), "{:?}", output);
    let json = stdout_json(&output);
    assert_eq!(json["probabilities"].as_array().unwrap().len(), 5);
    assert_eq!(json["riskTypes"][0], "ransomware");
    assert!(json["riskScore"].as_f64().unwrap() > 0.99);
}

#[test]
fn mitigate_without_oracle_reports_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());
    let mut args = vec!["mitigate", "--model", model.to_str().unwrap(), "--oracle", "none"];
    args.extend(ZEROS);

    let output = cyrisk(&args);
    assert!(output.status.success(), "{:?}", output);
    let json = stdout_json(&output);
    assert_eq!(json["orderingSource"]["kind"], "fallback");
    assert_eq!(json["orderingSource"]["reason"], "noOracle");
    assert_eq!(json["implementationPriority"], "high");
    assert!(json["finalRisk"].as_f64().unwrap() < 0.01);
}

#[test]
fn mitigate_with_perturbation_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());
    let mut args = vec![
        "mitigate",
        "--model",
        model.to_str().unwrap(),
        "--samples",
        "4",
        "--seed",
        "11",
    ];
    args.extend(ZEROS);

    let first = cyrisk(&args);
    let second = cyrisk(&args);
    assert!(first.status.success(), "{:?}", first);
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(stdout_json(&first)["orderingSource"]["kind"], "importance");
}

#[test]
fn recommend_prints_delta() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());
    let mut args = vec![
        "recommend",
        "--model",
        model.to_str().unwrap(),
        "--group",
        "4.3",
        "--option",
        "No",
    ];
    args.extend(ZEROS);

    let output = cyrisk(&args);
    assert!(output.status.success(), "{:?}", output);
    let json = stdout_json(&output);
    assert!(json["riskReduction"].as_f64().unwrap() >= 0.0);
    assert!(json.get("riskReductionPercentage").is_some());
}

#[test]
fn bad_input_exits_with_two() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path());

    let output = cyrisk(&["predict", "--model", model.to_str().unwrap(), "0", "1"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));

    let missing = dir.path().join("absent.json");
    let mut args = vec!["predict", "--model", missing.to_str().unwrap()];
    args.extend(ZEROS);
    let output = cyrisk(&args);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load model"));
}

#[test]
fn columns_needs_no_model() {
    let output = cyrisk(&["columns"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["width"], 72);
    assert_eq!(json["groups"][2]["featureGroup"], "1.3");
}
