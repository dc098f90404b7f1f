//! End-to-end tests driving the `loxc` binary as a subprocess.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn loxc_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_loxc"))
}

fn write_source(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{source}").unwrap();
    file
}

#[test]
fn well_formed_program_exits_zero_and_prints_output() {
    let file = write_source("print 1 + 2;");

    Command::new(loxc_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3.00"));
}

#[test]
fn parse_error_exits_65() {
    let file = write_source("var a = ;");

    Command::new(loxc_bin()).arg(file.path()).assert().code(65);
}

#[test]
fn semantic_error_exits_65() {
    let file = write_source("print undefined_name;");

    Command::new(loxc_bin()).arg(file.path()).assert().code(65);
}

#[test]
fn runtime_error_exits_70() {
    let file = write_source("print 1 / 0;");

    Command::new(loxc_bin())
        .arg(file.path())
        .assert()
        .code(70)
        .stdout(predicate::str::contains("RUNTIME ERROR"));
}

#[test]
fn dump_tokens_prints_token_stream_without_running() {
    let file = write_source("var a = 1;");

    Command::new(loxc_bin())
        .arg(file.path())
        .arg("--dump-tokens")
        .assert()
        .success()
        .stdout(predicate::str::contains("Var"));
}

#[test]
fn dump_ast_prints_the_parsed_program() {
    let file = write_source("var a = 1;");

    Command::new(loxc_bin())
        .arg(file.path())
        .arg("--dump-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("VarDecl"));
}

#[test]
fn dump_chunk_prints_disassembly_without_running() {
    let file = write_source("print 1;");

    Command::new(loxc_bin())
        .arg(file.path())
        .arg("--dump-chunk")
        .assert()
        .success()
        .stdout(predicate::str::contains("PRINT"));
}

#[test]
fn unrecognized_flag_is_a_usage_error() {
    let file = write_source("print 1;");

    Command::new(loxc_bin())
        .arg(file.path())
        .arg("--nonsense")
        .assert()
        .failure()
        .code(64);
}
