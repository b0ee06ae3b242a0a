use assert_cmd::Command;
use predicates::str::contains;
use std::fs::write;

fn record_json(detection: &str) -> String {
    format!(
        r#"{{
  "meta": {{
    "session_id": "6f1c2b1e-8f71-4a3a-9a64-0d5a2f9b8d11",
    "subject_id": "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed",
    "image_id": "9c858901-8a57-4791-81fe-4c455b099bc9",
    "captured_at": "2026-08-01T09:30:00Z",
    "model_versions": {{"detector": "v2"}}
  }},
  "gate": {{
    "status": "pass",
    "reasons": [],
    "metrics": {{
      "oral_present_prob": 0.95,
      "blur_score": 120.0,
      "brightness_mean": 110.0,
      "clipping_ratio": 0.01,
      "contrast_std": 40.0
    }}
  }},
  "detection": {detection}
}}"#
    )
}

fn write_record(detection: &str) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write(file.path(), record_json(detection)).unwrap();
    file
}

#[test]
fn lesion_record_recommends_a_visit() {
    let file = write_record(
        r#"{"lesion": {"present": true, "count": 1, "max_score": 0.92, "area_ratio": 0.02}}"#,
    );
    let mut cmd = Command::cargo_bin("denticheck-cli").unwrap();
    cmd.args(["evaluate", "--record", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Risk level: recommend_visit"))
        .stdout(contains("lesion_detected"))
        .stdout(contains("hospital_visit_lesion"))
        .stdout(contains("Safety flag set: lesion_caution_text_required"));
}

#[test]
fn clean_record_emits_maintenance_action_as_json() {
    let file = write_record(r#"{"caries": {"present": false}}"#);
    let mut cmd = Command::cargo_bin("denticheck-cli").unwrap();
    cmd.args([
        "evaluate",
        "--record",
        file.path().to_str().unwrap(),
        "--json",
    ])
    .assert()
    .success()
    .stdout(contains("\"level\": \"normal\""))
    .stdout(contains("maintain_routine"));
}

#[test]
fn raw_detector_labels_are_normalized() {
    let file = write_record(
        r#"{"calculus": {"present": true, "count": 2, "max_score": 0.8, "area_ratio": 0.01}}"#,
    );
    let mut cmd = Command::cargo_bin("denticheck-cli").unwrap();
    cmd.args(["evaluate", "--record", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Risk level: attention"))
        .stdout(contains("calculus_present"))
        .stdout(contains("scaling_consult"));
}

#[test]
fn malformed_record_is_rejected() {
    let file = write_record(
        r#"{"caries": {"present": true, "count": 1, "max_score": 3.5, "area_ratio": 0.0}}"#,
    );
    let mut cmd = Command::cargo_bin("denticheck-cli").unwrap();
    cmd.args(["evaluate", "--record", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("max score"));
}
