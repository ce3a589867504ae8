//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SPRING: &str = "../../datasets/spring-cohort.toml";
const AUTUMN: &str = "../../datasets/autumn-cohort.json";

fn gapscope() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("gapscope").unwrap();
    cmd.env_remove("GAPSCOPE_MIN_SHARED_TOPICS")
        .env_remove("GAPSCOPE_MINUTES_PER_UNIT")
        .env_remove("GAPSCOPE_LAYOUT_SEED")
        .env("HOME", "/nonexistent-gapscope-home");
    cmd
}

#[test]
fn validate_toml_dataset() {
    gapscope()
        .arg("validate")
        .arg("--dataset")
        .arg(SPRING)
        .assert()
        .success()
        .stdout(predicate::str::contains("Spring Cohort (5 entities, 2 series)"))
        .stdout(predicate::str::contains("All datasets valid"));
}

#[test]
fn validate_directory() {
    gapscope()
        .arg("validate")
        .arg("--dataset")
        .arg("../../datasets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Spring Cohort"))
        .stdout(predicate::str::contains("Autumn Cohort"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("odd.toml");
    std::fs::write(
        &path,
        r#"
[dataset]
id = "odd"

[[entities]]
id = "a"
weak_topics = [{ topic = "x", intensity = 4.0 }]
"#,
    )
    .unwrap();

    gapscope()
        .arg("validate")
        .arg("--dataset")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[a] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    gapscope()
        .arg("validate")
        .arg("--dataset")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_dangling_primary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[dataset]\nid = \"b\"\nprimary_entity = \"ghost\"\n").unwrap();

    gapscope()
        .arg("validate")
        .arg("--dataset")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("primary entity not found: ghost"));
}

#[test]
fn cluster_default_threshold() {
    gapscope()
        .arg("cluster")
        .arg("--dataset")
        .arg(SPRING)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 cluster(s) at 3 shared topic(s)"))
        .stdout(predicate::str::contains("s1, s2"))
        .stdout(predicate::str::contains("s3, s4"))
        .stdout(predicate::str::contains("Unclustered: s5 (Kai Moreno)"));
}

#[test]
fn cluster_json_output() {
    let output = gapscope()
        .arg("cluster")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["clusters"][0]["member_ids"], serde_json::json!(["s1", "s2"]));
    assert_eq!(json["unclustered"], serde_json::json!(["s5"]));
}

#[test]
fn cluster_threshold_from_env() {
    gapscope()
        .env("GAPSCOPE_MIN_SHARED_TOPICS", "1")
        .arg("cluster")
        .arg("--dataset")
        .arg(SPRING)
        .assert()
        .success()
        .stdout(predicate::str::contains("s1, s2, s3, s4"));
}

#[test]
fn trend_directions() {
    gapscope()
        .arg("trend")
        .arg("--dataset")
        .arg(SPRING)
        .assert()
        .success()
        .stdout(predicate::str::contains("improving"))
        .stdout(predicate::str::contains("declining"));
}

#[test]
fn trend_unknown_series() {
    gapscope()
        .arg("trend")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--series")
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("series not found"));
}

#[test]
fn trend_flat_series_json() {
    gapscope()
        .arg("trend")
        .arg("--dataset")
        .arg(AUTUMN)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"direction\": \"flat\""));
}

#[test]
fn sync_against_primary() {
    gapscope()
        .arg("sync")
        .arg("--dataset")
        .arg(SPRING)
        .assert()
        .success()
        .stdout(predicate::str::contains("Avery Lee"))
        .stdout(predicate::str::contains("Perfect"))
        .stdout(predicate::str::contains("Poor"));
}

#[test]
fn layout_json_positions() {
    let output = gapscope()
        .arg("layout")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let positions = json["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 7);
    assert!(positions.iter().all(|p| p["x"].as_f64().unwrap().is_finite()));
}

#[test]
fn layout_trace_prints_steps() {
    gapscope()
        .arg("layout")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--steps")
        .arg("5")
        .arg("--trace")
        .assert()
        .success()
        .stderr(predicate::str::contains("step 1 alpha"))
        .stderr(predicate::str::contains("finished after"));
}

#[test]
fn analyze_writes_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("out").join("report.json");

    gapscope()
        .arg("analyze")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Clusters: 2"))
        .stdout(predicate::str::contains("Unclustered: s5"));

    let content = std::fs::read_to_string(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["dataset"]["id"], "spring-cohort");
}

#[test]
fn analyze_markdown() {
    gapscope()
        .arg("analyze")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Gap analysis: Spring Cohort"))
        .stdout(predicate::str::contains("## Trends"));
}

#[test]
fn analyze_with_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("gapscope.toml");
    std::fs::write(&config, "[clustering]\nmin_shared_topics = 10\n").unwrap();

    gapscope()
        .arg("analyze")
        .arg("--dataset")
        .arg(SPRING)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Clusters: 0"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    gapscope()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gapscope.toml"))
        .stdout(predicate::str::contains("Created datasets/example.toml"));

    assert!(dir.path().join("gapscope.toml").exists());
    assert!(dir.path().join("datasets/example.toml").exists());

    // the generated files are usable as-is
    gapscope()
        .current_dir(dir.path())
        .arg("analyze")
        .arg("--dataset")
        .arg("datasets/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("alex, blake"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    gapscope()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    gapscope()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    gapscope()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Learner gap analytics engine"));
}

#[test]
fn version_output() {
    gapscope()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gapscope"));
}
