//! Command-line tests running the built binary against a fixture artifact set

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use support::create_artifacts;
use tempfile::TempDir;

mod support;

fn shopper_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shopper-spectrum").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("SHOPPER_ARTIFACTS_DIR")
        .arg("--artifacts-dir")
        .arg(dir.path());
    cmd
}

#[test]
fn test_segment_prints_cluster_and_label() {
    let dir = create_artifacts();

    shopper_cmd(&dir)
        .args(["segment", "--recency", "10", "--frequency", "20", "--monetary", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Predicted Cluster: 2"))
        .stdout(predicate::str::contains("Predicted Customer Segment: Champions"));
}

#[test]
fn test_recommend_prints_title_cased_header_and_list() {
    let dir = create_artifacts();

    shopper_cmd(&dir)
        .args(["recommend", "white", "hanging", "heart", "t-light", "holder", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Top 2 products similar to White Hanging Heart T-Light Holder:",
        ))
        .stdout(predicate::str::contains("1. WHITE METAL LANTERN"))
        .stdout(predicate::str::contains("2. CREAM CUPID HEARTS COAT HANGER"))
        .stdout(predicate::str::contains("3.").not());
}

#[test]
fn test_verbose_lists_resolved_artifact_paths() {
    let dir = create_artifacts();
    let moved = dir.path().join("moved_similarity.csv");
    fs::rename(dir.path().join("product_similarity.csv"), &moved).unwrap();

    shopper_cmd(&dir)
        .arg("--similarity")
        .arg(&moved)
        .args(["--verbose", "recommend", "white metal lantern", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("similarity: {}", moved.display())))
        .stdout(predicate::str::contains("product_similarity.csv").not());
}

#[test]
fn test_unknown_product_is_a_warning() {
    let dir = create_artifacts();

    shopper_cmd(&dir)
        .args(["recommend", "pink flamingo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "warning: Product name 'pink flamingo' not found",
        ));
}

#[test]
fn test_product_without_similarity_data_is_a_warning() {
    let dir = create_artifacts();

    shopper_cmd(&dir)
        .args(["recommend", "Discontinued Sample"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "warning: Similarity data for product code '99999' not found.",
        ));
}

#[test]
fn test_blank_product_is_a_warning() {
    let dir = create_artifacts();

    shopper_cmd(&dir)
        .args(["recommend", "   "])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("warning: Please enter a product name."));
}

#[test]
fn test_missing_artifacts_exit_with_artifact_status() {
    let dir = create_artifacts();
    fs::remove_file(dir.path().join("rfm_kmeans.json")).unwrap();

    shopper_cmd(&dir)
        .arg("segment")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: could not read artifact"));
}

#[test]
fn test_scaler_arity_mismatch_exits_with_artifact_status() {
    let dir = create_artifacts();
    fs::write(
        dir.path().join("rfm_scaler.json"),
        r#"{"mean": [0.0, 0.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0, 1.0]}"#,
    )
    .unwrap();

    shopper_cmd(&dir)
        .arg("segment")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "error: The segmentation model could not score this customer.",
        ))
        .stdout(predicate::str::contains("Predicted").not());
}
