//! Integration tests for the rcpt binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DINER: &str = "Joe's Diner\n1x Coffee\n$3.50\nTotal $3.50\n";

/// CLI command with an isolated config directory.
fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rcpt"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_parse_file_as_json() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("diner.txt");
    fs::write(&input, DINER).unwrap();

    cli(&home)
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"store\": \"Joe's Diner\""))
        .stdout(predicate::str::contains("\"item\": \"Coffee\""))
        .stdout(predicate::str::contains("\"label\": \"TOTAL\""));
}

#[test]
fn test_parse_stdin_as_text_with_warnings() {
    let home = TempDir::new().unwrap();

    cli(&home)
        .args(["parse", "-", "--format", "text", "--warnings"])
        .write_stdin(DINER)
        .assert()
        .success()
        .stdout(predicate::str::contains("Store: Joe's Diner"))
        .stdout(predicate::str::contains("$3.50"))
        .stderr(predicate::str::contains("Could not extract date"));
}

#[test]
fn test_parse_csv_to_file() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("diner.txt");
    let output = home.path().join("diner.csv");
    fs::write(&input, DINER).unwrap();

    cli(&home)
        .arg("parse")
        .arg(&input)
        .args(["--format", "csv", "--output"])
        .arg(&output)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.contains("Coffee,1,3.50,3.50"));
    assert!(csv.contains("TOTAL,,,3.50"));
}

#[test]
fn test_parse_missing_file() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["parse", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_parse_with_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(&config, r#"{"extraction": {"enable_broad_fallback": false}}"#).unwrap();

    cli(&home)
        .arg("--config")
        .arg(&config)
        .args(["parse", "-"])
        .write_stdin("Milk 2,49\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"items\": []"));
}

#[test]
fn test_batch_transcripts_with_summary() {
    let home = TempDir::new().unwrap();
    let input_dir = home.path().join("in");
    let output_dir = home.path().join("out");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("diner.txt"), DINER).unwrap();
    fs::write(input_dir.join("empty.txt"), "").unwrap();

    let pattern = format!("{}/*.txt", input_dir.display());
    cli(&home)
        .args(["batch", &pattern, "--summary", "--output-dir"])
        .arg(&output_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    assert!(output_dir.join("diner.json").exists());
    assert!(output_dir.join("empty.json").exists());
    let summary = fs::read_to_string(output_dir.join("summary.csv")).unwrap();
    assert!(summary.contains("diner.txt,success,Joe's Diner"));
}

#[test]
fn test_process_without_api_key() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("receipt.jpg");
    fs::write(&image, [0xff, 0xd8, 0xff, 0xe0]).unwrap();

    cli(&home)
        .env_remove("GOOGLE_VISION_API_KEY")
        .arg("process")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_VISION_API_KEY"));
}

#[test]
fn test_config_init_and_get() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("rcpt.json");

    cli(&home)
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    cli(&home)
        .args(["config", "get", "server.route"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/process-receipt"));
}
