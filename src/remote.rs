//! SSH Remote Executor
//!
//! Runs commands on the target host through the stock `ssh` client and
//! copies files with `scp`. SSH authentication and host resolution are
//! whatever the user's ssh config says; no connection state is held between
//! commands.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{StevedoreError, StevedoreResult};
use crate::executor::{CommandOutput, RemoteExecutor};

/// Remote executor backed by ssh/scp child processes
pub struct SshExecutor {
    /// `user@host` ssh destination
    target: String,
}

impl SshExecutor {
    pub fn new(user: &str, host: &str) -> Self {
        Self {
            target: format!("{user}@{host}"),
        }
    }

    /// Check if the ssh client is installed and spawnable
    pub fn check_available() -> bool {
        // ssh without args returns non-zero, but if we can spawn it, it's available
        Command::new("ssh")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn exec(&self, command: &str) -> StevedoreResult<CommandOutput> {
        let output = Command::new("ssh")
            .arg(&self.target)
            .arg(command)
            .stdin(Stdio::inherit()) // Allow password input
            .output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl RemoteExecutor for SshExecutor {
    fn run(&self, command: &str) -> StevedoreResult<CommandOutput> {
        self.exec(command)
    }

    fn run_privileged(&self, command: &str) -> StevedoreResult<CommandOutput> {
        self.exec(&format!("sudo {command}"))
    }

    fn path_exists(&self, path: &str) -> bool {
        self.exec(&format!("test -e {}", shell_quote(path)))
            .map(|out| out.success)
            .unwrap_or(false)
    }

    fn copy_file(&self, local: &Path, remote_dir: &str) -> StevedoreResult<()> {
        let remote_dest = format!("{}:{}", self.target, remote_dir);

        let output = Command::new("scp")
            .arg("-p") // preserve timestamps
            .arg(local)
            .arg(&remote_dest)
            .stdin(Stdio::inherit()) // Allow password input
            .output()
            .map_err(|e| StevedoreError::TransferFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(StevedoreError::TransferFailed(format!(
                "scp to {} failed with exit code: {:?}",
                remote_dest,
                output.status.code()
            )));
        }

        Ok(())
    }
}

/// Quote a path for a remote shell command (simple escaping)
pub fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_user_at_host() {
        let executor = SshExecutor::new("root", "app01");
        assert_eq!(executor.target(), "root@app01");
    }

    #[test]
    fn check_available_does_not_panic() {
        let _ = SshExecutor::check_available();
    }

    #[test]
    fn shell_quote_simple() {
        assert_eq!(shell_quote("/opt/app/current"), "'/opt/app/current'");
    }

    #[test]
    fn shell_quote_with_quotes() {
        assert_eq!(shell_quote("it's a dir"), "'it'\\''s a dir'");
    }
}
