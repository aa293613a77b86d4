mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bindery() -> Command {
    Command::cargo_bin("bindery").unwrap()
}

#[test]
fn inspect_lists_chapters_without_converting() {
    let fixture = common::fixture_path("book.html");
    bindery()
        .args(["inspect", fixture.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.1-chapter-01"))
        .stdout(predicate::str::contains("chapter-1-1-chapter-01.xhtml"))
        .stdout(predicate::str::contains("Principles of Shaping"))
        .stdout(predicate::str::contains("Glossary"));
}

#[test]
fn inspect_json_output() {
    let fixture = common::fixture_path("book.html");
    bindery()
        .args(["inspect", fixture.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"original_id\": \"1.1-chapter-01\""))
        .stdout(predicate::str::contains("\"clean_id\": \"chapter-1-1-chapter-01\""));
}

#[test]
fn inspect_reports_missing_chapters() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("empty.html");
    std::fs::write(&input, "<html><body><p>nothing</p></body></html>").unwrap();

    bindery()
        .args(["inspect", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No chapter blocks found"));
}

#[test]
fn inspect_missing_file_fails() {
    bindery()
        .args(["inspect", "nonexistent.html"])
        .assert()
        .failure();
}
