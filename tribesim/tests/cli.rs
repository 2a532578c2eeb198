// The cargo_bin! macro requires build script setup that's overkill for simple tests.
// Suppress deprecation warning on the function until we need custom build-dir support.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::tempdir;

fn demo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/skirmish.json")
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::new(cargo_bin("tribesim"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--scenario"));
}

#[test]
fn test_missing_scenario_fails() {
    let mut cmd = Command::new(cargo_bin("tribesim"));
    cmd.arg("--scenario")
        .arg("/nonexistent/scenario.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read scenario"));
}

#[test]
fn test_demo_runs_and_produces() {
    let mut cmd = Command::new(cargo_bin("tribesim"));
    cmd.arg("--scenario")
        .arg(demo())
        .arg("-t")
        .arg("40")
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished after 40 ticks"))
        .stdout(predicate::str::contains("Player 1 (barbarians)"))
        .stdout(predicate::str::contains("log: 1"))
        .stdout(predicate::str::contains("Checksum:"));
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        Command::new(cargo_bin("tribesim"))
            .arg("--scenario")
            .arg(demo())
            .arg("-t")
            .arg("20")
            .output()
            .expect("failed to execute")
    };
    let a = run();
    let b = run();
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn test_config_and_save() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    let save = dir.path().join("world.json");
    std::fs::write(&config, r#"{ "tick_ms": 500, "sound_at_message": false }"#).unwrap();

    let mut cmd = Command::new(cargo_bin("tribesim"));
    cmd.arg("--scenario")
        .arg(demo())
        .arg("--config")
        .arg(&config)
        .arg("--save")
        .arg(&save)
        .arg("-t")
        .arg("4")
        .assert()
        .success()
        .stdout(predicate::str::contains("(2000 ms game time)"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&save).unwrap()).unwrap();
    assert_eq!(saved["tick"], 4);
}

#[test]
fn test_quit_stops_early() {
    let dir = tempdir().unwrap();
    let mut scenario: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(demo()).unwrap()).unwrap();
    scenario["timeline"] = serde_json::json!([{ "tick": 2, "player": 1, "command": "Quit" }]);
    let path = dir.path().join("quit.json");
    std::fs::write(&path, scenario.to_string()).unwrap();

    let mut cmd = Command::new(cargo_bin("tribesim"));
    cmd.arg("--scenario")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished after 2 ticks"));
}
