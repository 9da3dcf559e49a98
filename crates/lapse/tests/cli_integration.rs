//! CLI integration tests for the Lapse command-line interface.
//!
//! Every test runs in a scratch directory with `LAPSE_CONFIG_DIR` pointed
//! at an empty directory, so no real user or project config is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the lapse binary, isolated from any real config.
fn lapse(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lapse").unwrap();
    cmd.current_dir(dir.path())
        .env("LAPSE_CONFIG_DIR", dir.path().join("user-config"));
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    lapse(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lapse"))
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("soak"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    lapse(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lapse"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    let dir = TempDir::new().unwrap();
    lapse(&dir).arg("frobnicate").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Demo
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_demo_round_trips_payload() {
    let dir = TempDir::new().unwrap();
    lapse(&dir)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("website"))
        .stdout(predicate::str::contains("longhoang.de"));
}

#[test]
fn test_demo_json_output() {
    let dir = TempDir::new().unwrap();
    let output = lapse(&dir)
        .args(["--json", "demo", "--website", "example.org"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data"]["website"], "example.org");
    assert!(value["session_id"].as_str().is_some_and(|id| !id.is_empty()));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_defaults() {
    let dir = TempDir::new().unwrap();
    lapse(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_age_secs = 5"))
        .stdout(predicate::str::contains("sweep_interval_secs = 1"));
}

#[test]
fn test_config_reads_project_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lapse.toml"),
        "[session]\nmax_age_secs = 120\nsweep_interval_secs = 10\n",
    )
    .unwrap();

    lapse(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_age_secs = 120"))
        .stdout(predicate::str::contains("● loaded"));
}

#[test]
fn test_config_skips_broken_project_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lapse.toml"), "[session\nmax_age_secs =").unwrap();

    lapse(&dir)
        .args(["config", "--sources"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✗ skipped"))
        .stderr(predicate::str::contains("Skipped"));
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lapse.toml"),
        "[session]\nmax_age_secs = 120\nsweep_interval_secs = 10\n",
    )
    .unwrap();

    let output = lapse(&dir)
        .args(["--json", "--max-age-secs", "60", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["config"]["session"]["max_age_secs"], 60);
    assert_eq!(value["config"]["session"]["sweep_interval_secs"], 10);
}

#[test]
fn test_invalid_sweep_interval_rejected() {
    let dir = TempDir::new().unwrap();
    lapse(&dir)
        .args(["--max-age-secs", "2", "--sweep-interval-secs", "2", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid session configuration"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Store-driving commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_watch_sees_every_eviction() {
    let dir = TempDir::new().unwrap();
    let output = lapse(&dir)
        .args([
            "--json",
            "--max-age-secs",
            "2",
            "--sweep-interval-secs",
            "1",
            "watch",
            "--sessions",
            "3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let evictions = stdout
        .lines()
        .filter(|line| line.contains("\"evicted\""))
        .count();
    assert_eq!(evictions, 3);
}

#[test]
fn test_watch_waits_for_evictions_after_first_sweep() {
    // Every session expires in the same sweep pass; the command must still
    // report all of them instead of stopping after the first event.
    let dir = TempDir::new().unwrap();
    let output = lapse(&dir)
        .args([
            "--max-age-secs",
            "2",
            "--sweep-interval-secs",
            "1",
            "watch",
            "--sessions",
            "5",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let created = stdout.lines().filter(|l| l.starts_with("created ")).count();
    let evicted = stdout.lines().filter(|l| l.starts_with("evicted ")).count();
    assert_eq!(created, 5);
    assert_eq!(evicted, 5);
    assert!(stdout.contains("Evicted: 5"));
}

#[test]
fn test_soak_reports_only_defined_errors() {
    let dir = TempDir::new().unwrap();
    let output = lapse(&dir)
        .args([
            "--json",
            "--max-age-secs",
            "2",
            "--sweep-interval-secs",
            "1",
            "soak",
            "--workers",
            "4",
            "--duration-secs",
            "1",
            "--sessions",
            "16",
            "--drain",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["report"]["id_failures"], 0);
    assert_eq!(value["drained"], true);
    assert_eq!(value["sessions"], 16);
    assert!(value["report"]["creates"].as_u64().unwrap() <= 4 * 16);
    assert_eq!(value["stats"]["live"], 0);
}
