//! Contract tests for the `tb_cli` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("tb_cli").unwrap()
}

fn json_of(args: &[&str]) -> Value {
    let output = cli().args(args).output().expect("Failed to run CLI");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    serde_json::from_str(&stdout).expect("Invalid JSON output")
}

#[test]
fn help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("--variant"));
}

#[test]
fn linear_demo_wins_in_one_substitution() {
    cli()
        .args(["demo", "linear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("single-root"))
        .stdout(predicate::str::contains("Total reward: 5"));
}

#[test]
fn quadratic_demo_collects_both_roots() {
    let json = json_of(&["demo", "quadratic", "--json"]);
    assert_eq!(json["total_reward"], 13.0);
    assert_eq!(json["board"]["found_roots"], serde_json::json!(["2", "3"]));
    assert_eq!(json["board"]["complete_declared"], true);
}

#[test]
fn quintic_demos_score_the_declaration() {
    let right = json_of(&["demo", "quintic", "--json"]);
    assert_eq!(right["total_reward"], 4.5);
    let wrong = json_of(&["demo", "solvable-quintic", "--json"]);
    assert_eq!(wrong["total_reward"], -4.0);
}

#[test]
fn prose_demo_reports_the_rejected_substitution() {
    cli()
        .args(["demo", "prose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cannot be extracted"))
        .stdout(predicate::str::contains("Total reward: 1"));
}

#[test]
fn cardano_demo_verifies_a_root() {
    let json = json_of(&["demo", "cardano", "--json"]);
    assert_eq!(json["board"]["lhs"], "0");
    assert_eq!(json["board"]["found_roots"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["errors"], 0);
}

#[test]
fn unknown_demo_is_rejected() {
    cli()
        .args(["demo", "sextic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn run_reads_script_from_stdin() {
    let script = r#"[
        {"kind": "write", "text": "the roots are 1 and -1"},
        {"kind": "subs", "expr": "1"},
        {"kind": "reset"},
        {"kind": "subs", "expr": "-1"},
        {"kind": "complete"}
    ]"#;
    let output = cli()
        .args(["run", "x^2 - 1 = 0", "-", "--json"])
        .write_stdin(script)
        .output()
        .expect("Failed to run CLI");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rewards: Vec<f64> = json["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["reward"].as_f64().unwrap())
        .collect();
    // L counts the non-whitespace characters of "x^2 - 1 = 0".
    assert_eq!(rewards, vec![0.0, 1.0, 0.0, 1.0, 7.0]);
}

#[test]
fn run_stop_on_error_fails() {
    cli()
        .args(["run", "x - 1 = 0", "-", "--stop-on-error"])
        .write_stdin(r#"[{"kind": "mul", "expr": "0"}, {"kind": "write", "text": "1"}]"#)
        .assert()
        .failure()
        .stdout(predicate::str::contains("cannot multiply both sides by zero"))
        .stderr(predicate::str::contains("rejected action"));
}

#[test]
fn run_rejects_malformed_scripts() {
    cli()
        .args(["run", "x - 1 = 0", "-"])
        .write_stdin("{not json")
        .assert()
        .failure();
}

#[test]
fn play_reads_actions_line_by_line() {
    cli()
        .args(["play", "x - 5 = 0"])
        .write_stdin("write 5\nsubs x -> 5\ncomplete\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 = 0"))
        .stdout(predicate::str::contains("total 6"))
        .stdout(predicate::str::contains("Episode over"));
}

#[test]
fn config_reflects_variant_flag() {
    cli()
        .args(["config", "--variant", "single-root"])
        .assert()
        .success()
        .stdout(predicate::str::contains("variant = \"single_root\""))
        .stdout(predicate::str::contains("extraction = \"strict\""));
}

#[test]
fn config_file_is_loaded() {
    let path = std::env::temp_dir().join(format!("tb_cli_config_{}.toml", std::process::id()));
    std::fs::write(&path, "variant = \"single_root\"\nmax_entry_chars = 32\n").unwrap();
    cli()
        .args(["config", "--config", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_entry_chars = 32"))
        .stdout(predicate::str::contains("extraction = \"permissive\""));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_config_file_is_an_error() {
    cli()
        .args(["demo", "linear", "--config", "/nonexistent/tb.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}
