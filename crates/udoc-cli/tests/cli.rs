//! Binary-level tests for the udoc CLI.

use assert_cmd::Command;
use predicates::prelude::*;

fn udoc() -> Command {
    Command::cargo_bin("udoc").expect("binary builds")
}

#[test]
fn help_lists_pipeline_stages() {
    udoc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("text"))
        .stdout(predicate::str::contains("crop"))
        .stdout(predicate::str::contains("markdown"))
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn unknown_flag_exits_nonzero() {
    udoc().args(["text", "--bogus"]).assert().failure();
}

#[test]
fn text_stage_writes_sorted_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("converted");
    let doc = input.join("report");
    std::fs::create_dir_all(&doc).unwrap();
    std::fs::write(
        doc.join("layout_001.json"),
        r#"{
            "page_index": 1,
            "boxes": [
                {"label": "paragraph_title", "coordinate": [0, 0, 100, 20], "text": "Heading"},
                {"label": "text", "coordinate": [0, 25, 100, 80], "text": "body"}
            ]
        }"#,
    )
    .unwrap();
    let output = dir.path().join("out");

    udoc()
        .args([
            "text",
            "--input_dir",
            input.to_str().unwrap(),
            "--output_dir",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed"));

    let sorted = output.join("report").join("layout_001_sorted.json");
    assert!(sorted.exists());
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sorted).unwrap()).unwrap();
    assert_eq!(record["sorted_texts"][0]["text"], "Heading");
    assert_eq!(
        record["sorted_texts"][0]["block_id"],
        record["sorted_texts"][1]["block_id"]
    );
}

#[test]
fn per_unit_failure_does_not_fail_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("converted");
    let doc = input.join("report");
    std::fs::create_dir_all(&doc).unwrap();
    // Crop needs a page image; none exists, so the unit fails but the batch
    // completes with exit code 0.
    std::fs::write(
        doc.join("layout_001.json"),
        r#"{"boxes": [{"label": "image", "coordinate": [0, 0, 500, 500]}]}"#,
    )
    .unwrap();
    let output = dir.path().join("crops");

    udoc()
        .args([
            "crop",
            "--input_dir",
            input.to_str().unwrap(),
            "--output_dir",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"));
}
