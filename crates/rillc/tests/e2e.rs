//! End-to-end tests for the rillc binary: `check` output, diagnostics in
//! both output modes, rill.toml handling, and `ast`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Locate the rillc binary built by cargo.
fn rillc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rillc"))
}

fn write_source(dir: &Path, name: &str, src: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, src).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(rillc_bin())
        .args(args)
        .env_remove("RILL_LOG")
        .output()
        .expect("failed to run rillc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// First JSON object in a stream of concatenated objects.
fn first_json(text: &str) -> serde_json::Value {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
    stream
        .next()
        .expect("no JSON object in output")
        .expect("first JSON object is not valid")
}

// ── check ────────────────────────────────────────────────────────────

#[test]
fn test_check_prints_instances_and_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(
        dir.path(),
        "main.rl",
        "def id(x)\n  x\nend\ndef each_one\n  yield 1\nend\ndef unused\nend\nid(1)\nid('c')\neach_one do |n|\n  n\nend\nid('d')\n",
    );

    let output = run(&["check", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "id(Int) -> Int\nid(Char) -> Char\neach_one() with block -> Int\nunused: never called\nresult: Char\n"
    );
}

#[test]
fn test_check_union_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(
        dir.path(),
        "main.rl",
        "def foo\n  yield 1\nend\n\ny = 'a'\nfoo do |x|\n  y = 1\nend\ny\n",
    );
    let output = run(&["check", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).ends_with("result: Char | Int\n"), "{}", stdout(&output));
}

#[test]
fn test_check_ast_lists_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "x = 1\ny = x\n");
    let output = run(&["check", "--ast", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("1:1\tx = 1 : Int\n"), "{out}");
    assert!(out.contains("2:5\tx : Int\n"), "{out}");
}

#[test]
fn test_check_json_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "def id(x)\n  x\nend\nid(2.5)\n");
    let output = run(&["check", "--json", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["result"], "Float");
    assert_eq!(json["methods"][0]["name"], "id");
    assert_eq!(json["methods"][0]["instances"][0]["returns"], "Float");
}

// ── Diagnostics ──────────────────────────────────────────────────────

#[test]
fn test_type_error_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "x = 1\nfoo(x)\n");
    let output = run(&["check", "--no-color", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("E0002"), "{err}");
    assert!(err.contains("undefined method `foo`"), "{err}");
    assert!(err.contains("could not type-check"), "{err}");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_type_error_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "def foo\n  yield\nend\nfoo\n");
    let output = run(&["check", "--json", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let json = first_json(&stderr(&output));
    assert_eq!(json["code"], "E0003");
    assert_eq!(json["severity"], "error");
    assert_eq!(json["method"], "foo");
    assert!(!json["spans"].as_array().unwrap().is_empty());
}

#[test]
fn test_parse_error_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "def foo\n  1\n");
    let output = run(&["check", "--no-color", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("expected `end` to close `def`, found end of file"), "{err}");
    assert!(err.contains("could not parse"), "{err}");

    let output = run(&["check", "--json", file.to_str().unwrap()]);
    let json = first_json(&stderr(&output));
    assert_eq!(json["code"], "P0001");
    assert_eq!(json["spans"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.rl");
    let output = run(&["check", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read"), "{}", stderr(&output));
}

// ── Configuration ────────────────────────────────────────────────────

const NESTED: &str = "def a\n  b\nend\ndef b\n  1\nend\na\n";

#[test]
fn test_rill_toml_beside_source_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", NESTED);
    std::fs::write(dir.path().join("rill.toml"), "[typeck]\nmax_depth = 1\n").unwrap();

    let output = run(&["check", "--no-color", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("E0005"), "{}", stderr(&output));

    let output = run(&["check", "--max-depth", "8", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).ends_with("result: Int\n"));
}

#[test]
fn test_explicit_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "main.rl", "1\n");
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[typeck]\nmax_depth = \"deep\"\n").unwrap();

    let output = run(&["check", "--config", bad.to_str().unwrap(), file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to parse config"), "{}", stderr(&output));
}

// ── ast ──────────────────────────────────────────────────────────────

#[test]
fn test_ast_prints_json_program() {
    let dir = tempfile::tempdir().unwrap();
    let src = "y = 'a'\nfoo { |x| y = x }\n";
    let file = write_source(dir.path(), "main.rl", src);
    let output = run(&["ast", file.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let program: rill_parser::ast::Program = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(program, rill_parser::parse(src).into_program());
}
