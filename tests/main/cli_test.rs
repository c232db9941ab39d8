//! CLI contract tests.

use assert_cmd::Command;

fn leadline() -> Command {
    Command::cargo_bin("leadline").expect("binary should build")
}

#[test]
fn help_lists_subcommands() {
    let output = leadline().arg("--help").output().expect("help should run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("models"));
    assert!(stdout.contains("leads"));
}

#[test]
fn unknown_subcommand_fails() {
    leadline().arg("frobnicate").assert().failure();
}

#[test]
fn leads_on_empty_database() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let output = leadline()
        .current_dir(tmp.path())
        .env("LEADLINE_DATABASE", tmp.path().join("leads.db"))
        .env_remove("LEADLINE_CONFIG")
        .args(["leads", "--limit", "5"])
        .output()
        .expect("leads should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("No leads captured yet."));
}

#[test]
fn models_without_api_key_fails() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    leadline()
        .current_dir(tmp.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("LEADLINE_CONFIG")
        .arg("models")
        .assert()
        .failure();
}
