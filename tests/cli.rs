// Drives the compiled binary through its non-interactive subcommands.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::tempdir;

fn timed_typer(profile: &Path) -> Command {
    let mut cmd = Command::cargo_bin("timed-typer").unwrap();
    cmd.env_remove("TIMED_TYPER_SEED")
        .env_remove("TIMED_TYPER_LOG")
        .arg("--no-color")
        .arg("--profile")
        .arg(profile);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn report_for_fresh_profile() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("progress.md");

    let out = stdout_of(
        timed_typer(&dir.path().join("profile.json"))
            .arg("report")
            .arg("--output")
            .arg(&report),
    );
    assert!(out.contains("Report written to:"));

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.contains("| 1 | Ping | 12 | 80% | 45s | UNLOCKED | - |"));
    assert!(text.contains("| 5 | Firewall | 40 | 90% | 75s | LOCKED | - |"));
}

#[test]
fn selftest_passes_and_persists_unlocks() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("profile.json");

    let out = stdout_of(timed_typer(&profile).arg("selftest"));
    assert!(out.contains("[TEST A]"));
    assert!(out.contains("Self-test complete."));

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(doc["unlocks"]["2"], serde_json::json!(true));
    assert_eq!(doc["unlocks"]["3"], serde_json::json!(true));
    assert!(doc["pbs"].get("3").is_none());
}

#[test]
fn demo_rejects_unknown_level() {
    let dir = tempdir().unwrap();
    timed_typer(&dir.path().join("profile.json"))
        .args(["demo", "9"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn demo_runs_with_clamped_parameters() {
    let dir = tempdir().unwrap();
    let out = stdout_of(
        timed_typer(&dir.path().join("profile.json"))
            .args(["--seed", "3", "demo", "2", "--speed=-1", "--accuracy", "1.5"]),
    );
    assert!(out.contains("DEMO - Traceroute"));
    assert!(out.contains("Demo meets the level targets."));
}

#[test]
fn unlock_lock_and_reset() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("profile.json");

    let out = stdout_of(timed_typer(&profile).args(["unlock", "4"]));
    assert!(out.contains("Level 4 is now unlocked."));

    let out = stdout_of(timed_typer(&profile).args(["unlock", "4", "--lock"]));
    assert!(out.contains("Level 4 is now locked."));

    stdout_of(timed_typer(&profile).args(["unlock", "5"]));
    stdout_of(timed_typer(&profile).arg("reset"));
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(doc["unlocks"], serde_json::json!({"1": true}));
}

#[test]
fn batch_writes_report_and_advice() {
    let dir = tempdir().unwrap();
    let out = stdout_of(
        timed_typer(&dir.path().join("profile.json"))
            .current_dir(dir.path())
            .arg("batch"),
    );
    assert!(out.contains("-- Demo L5 (Firewall)"));
    assert!(out.contains("== Coaching Advice =="));
    assert!(out.contains("- Ping: No PB recorded yet."));
    assert!(dir.path().join("REPORT.md").exists());
}

#[test]
fn menu_quits_when_stdin_closes() {
    let dir = tempdir().unwrap();
    let out = stdout_of(timed_typer(&dir.path().join("profile.json")).write_stdin("a\n\nq\n"));
    assert!(out.contains("[1] Start"));
    assert!(out.contains("===== About ====="));
}
