use std::fs;

use serde_json::Value;
use tempfile::tempdir;

use strata::StrataError;
use strata_cli::Args;

fn args(output: String) -> Args {
    Args {
        input: "fixtures/graph.json".to_string(),
        output,
        log_level: "off".to_string(),
        ..Default::default()
    }
}

fn read(path: &std::path::Path) -> Value {
    let json = fs::read_to_string(path).expect("Failed to read snapshot");
    serde_json::from_str(&json).expect("Snapshot is not valid JSON")
}

#[test]
fn e2e_snapshot_for_every_algorithm() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    for algorithm in ["layered", "force", "grid"] {
        let output = temp_dir.path().join(format!("{algorithm}.json"));
        let args = Args {
            algorithm: Some(algorithm.to_string()),
            strict: true,
            ..args(output.to_string_lossy().to_string())
        };

        if let Err(err) = strata_cli::run(&args) {
            panic!("{algorithm} failed: {err}");
        }

        let snapshot = read(&output);
        assert_eq!(snapshot["algorithm"], algorithm);
        assert_eq!(snapshot["elements"].as_array().unwrap().len(), 9);
        assert_eq!(
            snapshot["layout"]["positions"].as_object().unwrap().len(),
            5,
            "{algorithm} should position every node"
        );
        assert_eq!(snapshot["layout"]["source"]["kind"], "computed");
    }
}

#[test]
fn e2e_hierarchy_assignment_hide_and_menu() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out.json");
    let args = Args {
        hierarchies: Some("fixtures/hierarchies.json".to_string()),
        assign: vec!["physics=course".to_string(), "mechanics=unit".to_string()],
        hidden: vec!["prism".to_string()],
        respect_hierarchy: true,
        menu_for: Some("mechanics".to_string()),
        ..args(output.to_string_lossy().to_string())
    };

    strata_cli::run(&args).expect("run should succeed");

    let snapshot = read(&output);
    assert_eq!(snapshot["hierarchy"]["id"], "curriculum");
    assert_eq!(snapshot["hierarchy"]["levels"].as_array().unwrap().len(), 3);
    assert_eq!(snapshot["diagnostics"]["hidden_nodes"], 1);
    assert!(snapshot["diagnostics"]["warning"].is_null());

    let physics = snapshot["elements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|element| element["id"] == "physics")
        .expect("physics should be rendered");
    assert_eq!(physics["data"]["level"], 1);

    let ids: Vec<&str> = snapshot["menu"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"add-child"));
    assert!(ids.contains(&"hide"));

    let assignments = snapshot["graph"]["nodes"][1]["assignments"].as_array().unwrap();
    assert_eq!(assignments[0]["levelId"], "unit");
}

#[test]
fn e2e_rejected_assignment_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        hierarchies: Some("fixtures/hierarchies.json".to_string()),
        assign: vec!["newton=course".to_string()],
        ..args(temp_dir.path().join("out.json").to_string_lossy().to_string())
    };

    let err = strata_cli::run(&args).unwrap_err();

    assert!(matches!(err, StrataError::Assignment(_)));
}

#[test]
fn e2e_unknown_algorithm_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        algorithm: Some("radial".to_string()),
        ..args(temp_dir.path().join("out.json").to_string_lossy().to_string())
    };

    let err = strata_cli::run(&args).unwrap_err();

    assert!(matches!(err, StrataError::Config(message) if message.contains("radial")));
}
