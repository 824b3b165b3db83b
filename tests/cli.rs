//! Command-line behavior of the kasha binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_program(dir: &TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("program.ksh");
    fs::write(&path, source).expect("write program");
    path
}

fn kasha() -> Command {
    Command::cargo_bin("kasha").expect("binary to be built")
}

#[test]
fn test_run_prints_to_stdout() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "a = 1 + 2\nprint(a, 4)\n");

    kasha()
        .arg(&path)
        .arg("--run")
        .assert()
        .success()
        .stdout("3 4\n");
}

#[test]
fn test_syntax_error_shows_context() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "a = 1\nb = \n");

    kasha()
        .arg(&path)
        .arg("--run")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("syntax error near Expression"))
        .stderr(predicate::str::contains(">>"));
}

#[test]
fn test_deep_nesting_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let source = format!("a = 1{}\n", " + 1".repeat(100_000));
    let path = write_program(&dir, &source);

    kasha()
        .arg(&path)
        .arg("--run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nested deeper than 256 levels"));
}

#[test]
fn test_runtime_error_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "print(1)\nlaunch()\n");

    kasha()
        .arg(&path)
        .arg("--run")
        .assert()
        .code(1)
        .stdout("1\n")
        .stderr(predicate::str::contains("unknown function 'launch'"));
}

#[test]
fn test_missing_file() {
    kasha()
        .arg("/nonexistent/program.ksh")
        .arg("--run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_emit_ast_tag() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "a = 1");

    kasha()
        .arg(&path)
        .args(["--emit", "ast-tag"])
        .assert()
        .success()
        .stdout("root(assign(var(a), lit(1)))\n");
}

#[test]
fn test_emit_grains() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "print(1, 2)");

    kasha()
        .arg(&path)
        .args(["--emit", "grains"])
        .assert()
        .success()
        .stdout("const 2\nconst 1\ncall print/2\ndiscard\n");
}

#[test]
fn test_emit_tokens_lists_actions() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "f()");

    kasha()
        .arg(&path)
        .args(["--emit", "tokens"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AddFuncCall 1..1"))
        .stdout(predicate::str::contains("Program 0..3 \"f()\""));
}

#[test]
fn test_unknown_emit_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "a = 1");

    kasha()
        .arg(&path)
        .args(["--emit", "xml"])
        .assert()
        .failure();
}

#[test]
fn test_stack_capacity_flag() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "print(1, 2, 3)");

    kasha()
        .arg(&path)
        .args(["--run", "--stack-capacity", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stack overflow (capacity 2)"));
}

#[test]
fn test_config_file_sets_stack_capacity() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "print(1, 2, 3)");
    let config = dir.path().join("kasha.toml");
    fs::write(&config, "[vm]\nstack_capacity = 1\n").unwrap();

    kasha()
        .arg(&path)
        .arg("--run")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("capacity 1"));
}

#[test]
fn test_native_build_reports_missing_compiler() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "print(1)");
    let config = dir.path().join("kasha.toml");
    fs::write(&config, "[native]\ncompiler = \"kasha-no-such-cc\"\n").unwrap();

    kasha()
        .arg(&path)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(dir.path().join("program"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to run kasha-no-such-cc"));
}
