use std::process::Command;

#[test]
fn test_help_lists_all_subcommands() {
    let bin = env!("CARGO_BIN_EXE_stevedore");

    let output = Command::new(bin).arg("--help").output().unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["deploy", "health-check", "service", "puppet", "config"] {
        assert!(
            stdout.contains(subcommand),
            "help output should list '{}'; got:\n{}",
            subcommand,
            stdout
        );
    }
}

#[test]
fn test_deploy_without_required_args_fails() {
    let bin = env!("CARGO_BIN_EXE_stevedore");

    let output = Command::new(bin)
        .args(["deploy", "--host", "app01"])
        .output()
        .unwrap();

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--bundle") || stderr.contains("required"),
        "expected a missing-argument error; got:\n{}",
        stderr
    );
}

#[test]
fn test_version_flag() {
    let bin = env!("CARGO_BIN_EXE_stevedore");

    let output = Command::new(bin).arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stevedore"));
}
