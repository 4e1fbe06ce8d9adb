use assert_cmd::Command;
use predicates::prelude::*;

fn docid() -> Command {
    Command::cargo_bin("docid").unwrap()
}

#[test]
fn test_help_lists_commands() {
    docid()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn test_config_init_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let path = path.to_str().unwrap();

    docid()
        .args(["config", "path", "--config", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    docid().args(["config", "init", "--config", path]).assert().success();

    docid()
        .args(["config", "get", "pdf.min_text_length", "--config", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("50"));
}

#[test]
fn test_extract_missing_file_fails() {
    docid()
        .args(["extract", "does-not-exist.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    docid()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}
