//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from any config or store outside `dir`.
fn lexiscreen(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("lexiscreen").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("LEXISCREEN_STORE")
        .env_remove("RUST_LOG");
    cmd
}

fn record_quiz(dir: &Path, test: &str, answers: &str) {
    lexiscreen(dir)
        .args(["record", "quiz", "--test", test, "--answers", answers])
        .assert()
        .success();
}

fn results_json(dir: &Path) -> serde_json::Value {
    let output = lexiscreen(dir)
        .args(["results", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    lexiscreen(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dyslexia screening score recorder"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    lexiscreen(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lexiscreen"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created lexiscreen.toml"))
        .stdout(predicate::str::contains("Created checklist-schoolAge.toml"));

    assert!(dir.path().join("lexiscreen.toml").exists());
    let template = std::fs::read_to_string(dir.path().join("checklist-schoolAge.toml")).unwrap();
    assert!(template.contains("age_group = \"schoolAge\""));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path()).arg("init").assert().success();

    lexiscreen(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn results_before_any_test() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results recorded yet."))
        .stdout(predicate::str::contains("Risk level: Unknown"));

    let json = results_json(dir.path());
    assert_eq!(json["averageScore"], 0);
    assert_eq!(json["riskLevel"], "Unknown");
    assert_eq!(json["recommendationTier"], "high-concern");
    assert_eq!(json["recommendations"].as_array().unwrap().len(), 6);
}

#[test]
fn record_quiz_and_ran_then_aggregate() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["record", "quiz", "--test", "phonological", "--answers", "1,1,1,1,1,0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Phonological Awareness: 83%"))
        .stdout(predicate::str::contains("Remaining tests:"));

    lexiscreen(dir.path())
        .args(["record", "ran", "--seconds", "50", "--category", "objects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("54%"));

    // mean 68.5: rounds to 69, unrounded mean sits in the Mild band
    let json = results_json(dir.path());
    assert_eq!(json["averageScore"], 69);
    assert_eq!(json["riskLevel"], "Mild");
    assert_eq!(json["recommendationTier"], "moderate-concern");
    assert_eq!(json["recommendations"].as_array().unwrap().len(), 6);

    let names: Vec<&str> = json["chartSeries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Phonological", "RAN"]);

    let store: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("lexiscreen-data/results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(store["testResults"]["phonological"], 83);
    assert_eq!(store["testResults"]["ran"], 54);
    assert!(store["testDates"]["ran"].is_string());
}

#[test]
fn retake_overwrites_previous_score() {
    let dir = TempDir::new().unwrap();

    record_quiz(dir.path(), "audio", "0,0,0,0,0");
    record_quiz(dir.path(), "audio", "1,1,1,1,1");

    let json = results_json(dir.path());
    assert_eq!(json["averageScore"], 100);
    assert_eq!(json["riskLevel"], "Low");
}

#[test]
fn quiz_with_wrong_answer_count_fails() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["record", "quiz", "--test", "phonological", "--answers", "1,0,1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expects 6 responses, got 3"));

    assert!(!dir.path().join("lexiscreen-data/results.json").exists());
}

#[test]
fn quiz_rejects_timed_tests() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["record", "quiz", "--test", "ran", "--answers", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a quiz-style test"));
}

#[test]
fn processing_speed_tally_is_checked() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args([
            "record",
            "processing-speed",
            "--correct",
            "10",
            "--missed",
            "5",
            "--targets",
            "12",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tally exceeds targets seen"));

    lexiscreen(dir.path())
        .args([
            "record",
            "processing-speed",
            "--correct",
            "4294967295",
            "--missed",
            "1",
            "--targets",
            "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tally exceeds targets seen"))
        .stderr(predicate::str::contains("panicked").not());

    lexiscreen(dir.path())
        .args([
            "record",
            "processing-speed",
            "--correct",
            "10",
            "--targets",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing Speed: 100%"));
}

#[test]
fn working_memory_session() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["record", "working-memory", "--trials", "1,1,1,1,1,1,1,1,1,1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Working Memory: 100%"));

    lexiscreen(dir.path())
        .args(["record", "working-memory", "--trials", "1,1,x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid outcome"));
}

#[test]
fn checklist_from_template() {
    let dir = TempDir::new().unwrap();

    let output = lexiscreen(dir.path())
        .args(["checklist", "--template", "school-age"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let template = String::from_utf8(output.stdout).unwrap();
    let filled = template.replace("= 0", "= 2");
    let answers = dir.path().join("answers.toml");
    std::fs::write(&answers, filled).unwrap();

    lexiscreen(dir.path())
        .arg("checklist")
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("Checklist (schoolAge): 67%"))
        .stdout(predicate::str::contains("Attention & Memory: 67%"));

    let json = results_json(dir.path());
    assert_eq!(json["averageScore"], 67);
    assert_eq!(json["chartSeries"][0]["name"], "Checklist");
}

#[test]
fn incomplete_checklist_is_rejected() {
    let dir = TempDir::new().unwrap();
    let answers = dir.path().join("answers.toml");
    std::fs::write(
        &answers,
        "age_group = \"preschool\"\n\n[answers]\n\"ps-speech-1\" = 1\n",
    )
    .unwrap();

    lexiscreen(dir.path())
        .arg("checklist")
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unanswered question(s)"));
}

#[test]
fn handwriting_from_rated_image() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("sample.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    lexiscreen(dir.path())
        .arg("handwriting")
        .arg("--image")
        .arg(&image)
        .args([
            "--formation",
            "4",
            "--spacing",
            "4",
            "--alignment",
            "4",
            "--reversals",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Handwriting: 94%"));

    let json = results_json(dir.path());
    assert_eq!(json["chartSeries"][0]["name"], "Handwriting");
    assert_eq!(json["chartSeries"][0]["score"], 94);
}

#[test]
fn handwriting_with_empty_image_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("empty.png");
    std::fs::write(&image, b"").unwrap();

    lexiscreen(dir.path())
        .arg("handwriting")
        .arg("--image")
        .arg(&image)
        .args([
            "--formation",
            "3",
            "--spacing",
            "3",
            "--alignment",
            "3",
            "--reversals",
            "3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("image payload is empty"));

    assert_eq!(results_json(dir.path())["riskLevel"], "Unknown");
}

#[test]
fn handwriting_rating_out_of_range() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("sample.png");
    std::fs::write(&image, b"img").unwrap();

    lexiscreen(dir.path())
        .arg("handwriting")
        .arg("--image")
        .arg(&image)
        .args([
            "--formation",
            "6",
            "--spacing",
            "3",
            "--alignment",
            "3",
            "--reversals",
            "3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside 1-5"));
}

#[test]
fn profile_appears_in_markdown() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["profile", "--name", "Ada", "--age", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile saved"));

    record_quiz(dir.path(), "direction", "1,1,1,1,1,1,0");

    lexiscreen(dir.path())
        .args(["results", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Screening Summary"))
        .stdout(predicate::str::contains("**Name:** Ada"))
        .stdout(predicate::str::contains("| Direction | 86% | 70% |  |"));

    // A later update keeps fields that were not given.
    lexiscreen(dir.path())
        .args(["profile", "--school", "Elm Street"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Ada\""))
        .stdout(predicate::str::contains("\"school\": \"Elm Street\""));
}

#[test]
fn report_writes_html_and_json() {
    let dir = TempDir::new().unwrap();
    record_quiz(dir.path(), "phonological", "1,0,1,0,1,0");

    let out = dir.path().join("out");
    lexiscreen(dir.path())
        .args(["report", "--format", "all", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("HTML report:"))
        .stdout(predicate::str::contains("JSON report:"));

    let files: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    let html = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "html"))
        .unwrap();
    let json = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();

    assert!(std::fs::read_to_string(html).unwrap().contains("<svg"));
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(report["aggregate"]["averageScore"], 50);
    assert_eq!(report["aggregate"]["riskLevel"], "Moderate");
}

#[test]
fn unknown_report_format_fails() {
    let dir = TempDir::new().unwrap();

    lexiscreen(dir.path())
        .args(["report", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn store_location_overrides() {
    let dir = TempDir::new().unwrap();
    let env_store = dir.path().join("env").join("store.json");
    let flag_store = dir.path().join("flag").join("store.json");

    lexiscreen(dir.path())
        .env("LEXISCREEN_STORE", &env_store)
        .args(["record", "quiz", "--test", "audio", "--answers", "1,1,1,1,0"])
        .assert()
        .success();
    assert!(env_store.exists());

    lexiscreen(dir.path())
        .env("LEXISCREEN_STORE", &env_store)
        .arg("--store")
        .arg(&flag_store)
        .args(["record", "quiz", "--test", "audio", "--answers", "1,1,1,1,1"])
        .assert()
        .success();
    assert!(flag_store.exists());
    assert!(!dir.path().join("lexiscreen-data").exists());
}

#[test]
fn config_policy_changes_threshold() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lexiscreen.toml"),
        "[policy]\nchart_threshold = 90\n",
    )
    .unwrap();
    record_quiz(dir.path(), "audio", "1,1,1,1,1");

    let json = results_json(dir.path());
    assert_eq!(json["chartSeries"][0]["threshold"], 90);
}

#[test]
fn corrupt_store_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");
    std::fs::write(&store, "{ not json").unwrap();

    lexiscreen(dir.path())
        .arg("--store")
        .arg(&store)
        .arg("results")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse store JSON"));
}

#[test]
fn malformed_record_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");
    std::fs::write(
        &store,
        r#"{"testResults": {"phonological": 80, "ran": "fast", "bogus": 10}, "checklistResults": 7}"#,
    )
    .unwrap();

    let output = lexiscreen(dir.path())
        .arg("--store")
        .arg(&store)
        .args(["results", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["averageScore"], 80);
    assert_eq!(json["chartSeries"].as_array().unwrap().len(), 1);
}
