use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn oplex_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_oplex"))
}

/// Runs the CLI with `source` on stdin. Returns (stdout, exit_code).
fn run(source: &str, args: &[&str]) -> (String, i32) {
    let mut child = Command::new(oplex_bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to run oplex");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(source.as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&out.stdout).into_owned(),
        out.status.code().unwrap_or(-1),
    )
}

#[test]
fn exits_zero_on_well_formed_source() {
    let (_, code) = run("x = 1\nprint(x)\n", &[]);
    assert_eq!(code, 0);
}

#[test]
fn exits_zero_even_on_malformed_source() {
    // The core never rejects input; exit code reflects I/O only.
    let (_, code) = run("def foo(\n", &[]);
    assert_eq!(code, 0);
}

#[test]
fn emits_compact_json_by_default() {
    let (out, _) = run("pass\n", &[]);
    let trimmed = out.trim();
    assert!(!trimmed.contains('\n'));
    let value: serde_json::Value = serde_json::from_str(trimmed).unwrap();
    assert_eq!(value, serde_json::json!([["pass"], "\n"]));
}

#[test]
fn pretty_flag_indents_output() {
    let (out, _) = run("pass\n", &["--pretty"]);
    assert!(out.contains('\n'), "pretty output should span multiple lines");
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value, serde_json::json!([["pass"], "\n"]));
}

#[test]
fn empty_stdin_produces_empty_tree() {
    let (out, code) = run("", &[]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(value, serde_json::json!([]));
}

#[test]
fn call_expression_round_trips_through_json() {
    let (out, _) = run("foo()\n", &[]);
    let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(value, serde_json::json!([[["foo"], "(", ")"], "\n"]));
}

#[test]
fn nested_blocks_use_indent_dedent_sentinels() {
    let (out, _) = run("def f():\n\tpass\n", &[]);
    let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    let flat = flatten(&value);
    assert!(flat.contains(&">>>".to_string()));
    assert!(flat.contains(&"<<<".to_string()));
}

fn flatten(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items.iter().flat_map(flatten).collect(),
        _ => vec![],
    }
}
