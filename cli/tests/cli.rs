use std::path::PathBuf;
use std::process::{Command, Output};

fn calcdoc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_calcdoc"))
        .args(args)
        .arg("--no-color")
        .output()
        .unwrap()
}

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../testdata")
}

#[test]
fn eval_prints_settled_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "Total\n```calc\n2\n3\n+\n```\n").unwrap();

    let out = calcdoc(&["eval", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "Total\n```calc\n5\n```\n");
    // Printing leaves the file alone.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "Total\n```calc\n2\n3\n+\n```\n"
    );
}

#[test]
fn bare_file_argument_means_eval() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "```calc\n9\nsqrt\n```\n").unwrap();

    let out = calcdoc(&[path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "```calc\n3\n```\n");
}

#[test]
fn eval_write_rewrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "```calc\n10\n4\nmod\n```\n").unwrap();

    let out = calcdoc(&["eval", "--write", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "```calc\n2\n```\n");
}

#[test]
fn eval_check_reports_unsettled_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let unsettled = dir.path().join("a.md");
    let settled = dir.path().join("b.md");
    std::fs::write(&unsettled, "```calc\n1\n1\n+\n```\n").unwrap();
    std::fs::write(&settled, "```calc\n2\n```\n").unwrap();

    assert_eq!(calcdoc(&["eval", "--check", unsettled.to_str().unwrap()]).status.code(), Some(1));
    assert!(calcdoc(&["eval", "--check", settled.to_str().unwrap()]).status.success());
}

#[test]
fn eval_renders_warnings_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "```calc\n1\n0\n/\n```\n").unwrap();

    let out = calcdoc(&["eval", path.to_str().unwrap()]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Calculator: Division by zero"), "{stderr}");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "```calc\n1\n0\n/\n```\n");
}

#[test]
fn settings_file_beside_input_is_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("calcdoc.toml"), "[fences]\nopen = \"```rpn\"\n").unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "```rpn\n4\n2\nswap\n```\n```calc\n1\n1\n+\n```\n").unwrap();

    let out = calcdoc(&["eval", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "```rpn\n2\n4\n```\n```calc\n1\n1\n+\n```\n"
    );
}

#[test]
fn invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[timing]\n\"^\" = \"immediate\"\n").unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "```calc\n1\n```\n").unwrap();

    let out = calcdoc(&["--config", config.to_str().unwrap(), "eval", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("^"));
}

#[test]
fn blocks_lists_fence_lines_and_stacks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "intro\n```calc\n1\n2\n```\n\n```calc\n```\n").unwrap();

    let out = calcdoc(&["blocks", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "2-5: 1 2\n7-8: (empty)\n"
    );
}

#[test]
fn operators_lists_tokens_with_timing() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("calcdoc.toml");
    std::fs::write(&config, "[timing]\n\"+\" = \"on-submit\"\n").unwrap();

    let out = calcdoc(&["--config", config.to_str().unwrap(), "operators"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let rows: Vec<Vec<&str>> = stdout.lines().map(|l| l.split_whitespace().collect()).collect();
    assert_eq!(rows.len(), 11);
    assert!(rows.contains(&vec!["+", "on-submit"]), "{stdout}");
    assert!(rows.contains(&vec!["*", "immediate"]), "{stdout}");
    assert!(rows.contains(&vec!["sqrt", "on-submit"]), "{stdout}");
}

#[test]
fn scenario_suite_passes() {
    let out = calcdoc(&["test", testdata().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "{stderr}");
    assert!(stderr.contains("test result: ok"), "{stderr}");
}

#[test]
fn scenario_categories_filter() {
    let out = calcdoc(&["test", testdata().to_str().unwrap(), "-c", "warnings"]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "{stderr}");
    assert!(stderr.contains("2 passed"), "{stderr}");
    assert!(!stderr.contains("arithmetic"), "{stderr}");
}

#[test]
fn failing_scenario_sets_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("wrong.test.md"),
        "---\nexpect = \"```calc\\n6\\n```\"\n---\n```calc\n2\n3\n+\n```\n",
    )
    .unwrap();

    let out = calcdoc(&["test", dir.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("document mismatch"), "{stderr}");
    assert!(stderr.contains("0 passed, 1 failed"), "{stderr}");
}
