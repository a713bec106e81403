#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REPO: &str = "arduino/report-size-deltas";
const RATE_OK: &str = r#"{"resources": {"core": {"limit": 5000, "remaining": 4999, "reset": 1700000000}}}"#;
const RATE_SPENT: &str = r#"{"resources": {"core": {"limit": 5000, "remaining": 0, "reset": 1700000000}}}"#;

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Runner-like invocation: a clean environment holding only what the
/// Actions runner would set.
fn action(dir: &TempDir, event: &str) -> Command {
    let mut cmd = Command::cargo_bin("reportsizedeltas").unwrap();
    cmd.env_clear()
        .current_dir(dir.path())
        .env("GITHUB_WORKSPACE", dir.path())
        .env("GITHUB_REPOSITORY", REPO)
        .env("GITHUB_EVENT_NAME", event)
        .env("REPORT_SIZE_DELTAS_RETRY_DELAY", "0")
        .arg("run");
    cmd
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("reportsizedeltas").unwrap();
    cmd.env_clear().arg("--workspace").arg(repo_root());
    cmd
}

/// Workspace with the fixture reports copied into `sketches-reports/`.
fn workspace_with_reports() -> TempDir {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("sketches-reports");
    std::fs::create_dir_all(&target).unwrap();
    let fixtures = repo_root().join(".github/workflows/testdata/sketches-reports");
    for entry in std::fs::read_dir(fixtures).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
    }
    dir
}

fn write_pr_event(dir: &TempDir, number: u64) -> PathBuf {
    let path = dir.path().join("event.json");
    std::fs::write(
        &path,
        format!(r#"{{"action": "synchronize", "pull_request": {{"number": {number}}}}}"#),
    )
    .unwrap();
    path
}

fn rate_limit(server: &mut mockito::Server, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/rate_limit")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

// ---------------------------------------------------------------------------
// run: local reports
// ---------------------------------------------------------------------------

#[test]
fn push_writes_report_to_destination_file() {
    let dir = workspace_with_reports();

    action(&dir, "push")
        .env("INPUT_DESTINATION-FILE", "out/size-deltas.md")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote report to"));

    let content = std::fs::read_to_string(dir.path().join("out/size-deltas.md")).unwrap();
    assert!(content.starts_with("### External libraries build test @ d8fd302\n\n"));
    assert!(content.contains("|ESP32|ESP8266\n"));
    assert!(content.contains("WiFi|2 :white_check_mark: |N/A\n"));
    assert!(content.contains("Servo|1 :x: |1 :warning: \n"));
    assert!(content.contains("\nGenerated on: "));
    assert!(!content.contains("->"));
}

#[test]
fn schedule_without_destination_fails() {
    let dir = workspace_with_reports();

    action(&dir, "schedule")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required input: destination-file"));
}

#[test]
fn missing_reports_folder_fails() {
    let dir = TempDir::new().unwrap();

    action(&dir, "push")
        .env("INPUT_DESTINATION-FILE", "report.md")
        .env("INPUT_SKETCHES-REPORTS-SOURCE", "nowhere")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sketches reports folder not found"));
}

#[test]
fn pull_request_comments_report() {
    let dir = workspace_with_reports();
    let event_path = write_pr_event(&dir, 42);
    let mut server = mockito::Server::new();
    let _rate = rate_limit(&mut server, RATE_OK);
    let comment = server
        .mock("POST", "/repos/arduino/report-size-deltas/issues/42/comments")
        .match_header("authorization", "token ghs_test")
        .match_body(Matcher::Regex(
            "1 :white_check_mark: 1 :warning: -> 2 :white_check_mark: ".into(),
        ))
        .with_status(201)
        .with_body("{}")
        .expect(1)
        .create();

    action(&dir, "pull_request")
        .env("GITHUB_EVENT_PATH", &event_path)
        .env("GITHUB_API_URL", server.url())
        .env("INPUT_GITHUB-TOKEN", "ghs_test")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commented report on PR #42"));

    comment.assert();
}

#[test]
fn workflow_run_reads_pr_number_from_input() {
    let dir = workspace_with_reports();
    write_pr_event(&dir, 7);
    let mut server = mockito::Server::new();
    let _rate = rate_limit(&mut server, RATE_OK);
    let comment = server
        .mock("POST", "/repos/arduino/report-size-deltas/issues/7/comments")
        .with_status(201)
        .with_body("{}")
        .expect(1)
        .create();

    let output = action(&dir, "workflow_run")
        .env("INPUT_PR-EVENT-PATH", "event.json")
        .env("GITHUB_API_URL", server.url())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("::debug::"));
    let last = stdout.lines().last().unwrap();
    let outcome: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(outcome["outcome"], "commented");
    assert_eq!(outcome["pr_number"], 7);

    comment.assert();
}

#[test]
fn pull_request_without_event_path_fails() {
    let dir = workspace_with_reports();

    action(&dir, "pull_request")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_EVENT_PATH"));
}

#[test]
fn spent_quota_stops_without_failing() {
    let dir = workspace_with_reports();
    let event_path = write_pr_event(&dir, 42);
    let mut server = mockito::Server::new();
    let _rate = rate_limit(&mut server, RATE_SPENT);
    let comment = server
        .mock("POST", "/repos/arduino/report-size-deltas/issues/42/comments")
        .expect(0)
        .create();

    action(&dir, "pull_request")
        .env("GITHUB_EVENT_PATH", &event_path)
        .env("GITHUB_API_URL", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "::warning::GitHub API request quota has been reached. Giving up for now.",
        ));

    comment.assert();
}

#[test]
fn deprecated_artifact_name_warns() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("legacy-reports");
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::copy(
        repo_root().join(".github/workflows/testdata/sketches-reports/esp32.json"),
        legacy.join("esp32.json"),
    )
    .unwrap();

    action(&dir, "push")
        .env("INPUT_SIZE-DELTAS-REPORTS-ARTIFACT-NAME", "legacy-reports")
        .env("INPUT_DESTINATION-FILE", "report.md")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "::warning::The size-deltas-report-artifact-name input is deprecated.",
        ));

    assert!(dir.path().join("report.md").is_file());
}

#[test]
fn missing_repository_is_rejected() {
    let dir = workspace_with_reports();

    action(&dir, "push")
        .env_remove("GITHUB_REPOSITORY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repository"));
}

#[test]
fn malformed_repository_is_rejected() {
    let dir = workspace_with_reports();

    action(&dir, "push")
        .env("GITHUB_REPOSITORY", "no-slash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid repository 'no-slash'"));
}

// ---------------------------------------------------------------------------
// inputs
// ---------------------------------------------------------------------------

#[test]
fn inputs_lists_defaults() {
    cli()
        .arg("inputs")
        .assert()
        .success()
        .stdout(predicate::str::contains("sketches-reports-source"))
        .stdout(predicate::str::contains("INPUT_SKETCHES-REPORTS-SOURCE"))
        .stdout(predicate::str::contains("destination-file"));
}

#[test]
fn inputs_masks_token_unless_asked() {
    cli()
        .args(["inputs", "--token", "ghs_ambient"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("ghs_ambient").not());

    let output = cli()
        .args(["inputs", "--json", "--show-secrets", "--token", "ghs_ambient"])
        .args(["--with", "destination-file=report.md"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let inputs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let find = |name: &str| {
        inputs
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["name"] == name)
            .unwrap()
            .clone()
    };
    assert_eq!(find("github-token")["value"], "ghs_ambient");
    assert_eq!(find("destination-file")["value"], "report.md");
    assert_eq!(find("destination-file")["supplied"], true);
    assert_eq!(find("sketches-reports-source")["value"], "sketches-reports");
}

#[test]
fn inputs_warns_on_undeclared_input() {
    cli()
        .args(["inputs", "--with", "bogus=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("::warning::Unexpected input 'bogus'"));
}

// ---------------------------------------------------------------------------
// jobs
// ---------------------------------------------------------------------------

fn jobs_json(args: &[&str]) -> serde_json::Value {
    let output = cli().arg("jobs").arg("--json").args(args).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

fn job<'a>(report: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    report["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|j| j["job"] == name)
        .unwrap()
}

#[test]
fn pull_request_selects_local_source_job() {
    let report = jobs_json(&["--event", "pull_request", "--changed", "action.yml"]);
    assert_eq!(report["triggered"], true);
    assert_eq!(job(&report, "local-source")["runs"], true);
    assert_eq!(job(&report, "local-source")["failure_tolerated"], false);
    assert_eq!(job(&report, "artifact-source")["runs"], false);
}

#[test]
fn fork_pull_request_tolerates_failure() {
    let report = jobs_json(&["--event", "pull_request", "--changed", "crates/x.rs", "--fork"]);
    assert_eq!(job(&report, "local-source")["failure_tolerated"], true);
}

#[test]
fn schedule_selects_artifact_source_job() {
    let report = jobs_json(&["--event", "schedule"]);
    assert_eq!(report["triggered"], true);
    assert_eq!(job(&report, "artifact-source")["runs"], true);
    assert_eq!(job(&report, "local-source")["runs"], false);
}

#[test]
fn unrelated_paths_do_not_trigger() {
    cli()
        .args(["jobs", "--event", "push", "--changed", "README.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workflow is not triggered by 'push'."));
}
