//! Integration tests for the morph binary.
//!
//! Every test builds its own source directory under a tempdir and drives
//! the real executable end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a CLI command.
fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_morph"))
}

#[test]
fn csv2json_converts_and_reports_counts() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("data.csv"),
        "col1,col2,col3,col4\n1,2.5,true,\n",
    )
    .unwrap();

    cli()
        .arg("csv2json")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted:"))
        .stdout(predicate::str::contains("1"));

    let json = fs::read_to_string(tmp.path().join("json").join("data.json")).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(rows[0]["col1"], 1);
    assert_eq!(rows[0]["col2"], 2.5);
    assert_eq!(rows[0]["col3"], true);
    assert_eq!(rows[0]["col4"], serde_json::Value::Null);
}

#[test]
fn missing_source_directory_exits_nonzero() {
    cli()
        .arg("csv2json")
        .arg("/no/such/directory")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn per_file_errors_still_exit_zero() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.png"), b"this is not an image").unwrap();

    cli()
        .arg("img2webp")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Errors:"))
        .stdout(predicate::str::contains("bad.png"));
}

#[test]
fn invalid_quality_fails_fast() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("ok.csv"), "a\n1\n").unwrap();

    cli()
        .arg("img2webp")
        .arg(tmp.path())
        .arg("--quality")
        .arg("150")
        .assert()
        .failure()
        .stderr(predicate::str::contains("quality"));
    assert!(!tmp.path().join("webp").exists());
}

#[test]
fn json_summary_is_machine_readable() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("doc.md"), "# Title\n\nBody text.\n").unwrap();

    let output = cli()
        .arg("md2html")
        .arg(tmp.path())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["total_converted"], 1);
    assert!(summary["output_folder"]
        .as_str()
        .unwrap()
        .ends_with("html"));
}

#[test]
fn md2html_writes_themed_document() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("doc.md"), "# Hello\n").unwrap();

    cli()
        .arg("md2html")
        .arg(tmp.path())
        .arg("--theme")
        .arg("dark")
        .assert()
        .success();

    let html = fs::read_to_string(tmp.path().join("html").join("doc.html")).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("background: #0d1117"));
    assert!(html.contains("<h1 id=\"hello\">"));
}

#[test]
fn html2md_honors_flags() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("page.html"),
        "<h1>Title</h1><ul><li>one</li></ul>",
    )
    .unwrap();

    cli()
        .arg("html2md")
        .arg(tmp.path())
        .arg("--bullet")
        .arg("*")
        .arg("--output-folder")
        .arg("md")
        .assert()
        .success();

    let md = fs::read_to_string(tmp.path().join("md").join("page.md")).unwrap();
    assert!(md.contains("# Title"));
    assert!(md.contains("* one"));
}

#[test]
fn text2pdf_produces_pdf_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("note.txt"), "A short note.\n").unwrap();

    cli().arg("text2pdf").arg(tmp.path()).assert().success();

    let bytes = fs::read(tmp.path().join("pdf").join("note.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn quiet_mode_suppresses_summary() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("doc.md"), "# Hi\n").unwrap();

    let output = cli()
        .arg("--quiet")
        .arg("md2html")
        .arg(tmp.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    assert!(stdout.is_empty());
}

#[test]
fn existing_outputs_are_skipped_without_overwrite() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("dot.png"), b"placeholder").unwrap();
    // Pre-existing output: the source must be skipped before it is ever
    // decoded.
    fs::create_dir(tmp.path().join("webp")).unwrap();
    fs::write(tmp.path().join("webp").join("dot.webp"), b"already here").unwrap();

    let output = cli()
        .arg("img2webp")
        .arg(tmp.path())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["total_converted"], 0);
    assert_eq!(summary["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(summary["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn formats_lists_all_converters() {
    cli()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("html2md"))
        .stdout(predicate::str::contains("img2webp"))
        .stdout(predicate::str::contains("csv2json"))
        .stdout(predicate::str::contains("md2html"))
        .stdout(predicate::str::contains("text2pdf"));
}

#[test]
fn formats_json_is_parseable() {
    let output = cli().arg("formats").arg("--json").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let listing: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(listing.len(), 5);
}

#[test]
fn help_text_covers_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("html2md"))
        .stdout(predicate::str::contains("text2pdf"));
}
