//! Integration tests for the config inspection command.

use std::process::Command;

fn run_config(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_stevedore");
    Command::new(bin).args(args).output().unwrap()
}

#[test]
fn test_config_defaults_when_no_file_present() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("stevedore.toml");

    let output = run_config(&["config", "--config", missing.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install_root        = /opt/app"));
    assert!(stdout.contains("current  -> /opt/app/current"));
}

#[test]
fn test_config_reads_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stevedore.toml");
    std::fs::write(
        &path,
        "install_root = \"/opt/liferay\"\nproxy_service = \"nginx\"\n",
    )
    .unwrap();

    let output = run_config(&["config", "--config", path.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install_root        = /opt/liferay"));
    assert!(stdout.contains("proxy_service       = nginx"));
    assert!(stdout.contains("previous -> /opt/liferay/previous"));
}

#[test]
fn test_config_json_output_is_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("stevedore.toml");

    let output = run_config(&["config", "--json", "--config", missing.to_str().unwrap()]);

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("config --json should emit valid JSON");
    assert_eq!(
        value["derived"]["current_symlink"],
        serde_json::json!("/opt/app/current")
    );
    assert_eq!(value["settings"]["remote_user"], serde_json::json!("root"));
}

#[test]
fn test_config_rejects_malformed_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stevedore.toml");
    std::fs::write(&path, "warmup_secs = \"soon\"").unwrap();

    let output = run_config(&["config", "--config", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid configuration file"),
        "expected config parse error; got:\n{}",
        stderr
    );
}
