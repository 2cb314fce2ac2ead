//! Remote Executor Port
//!
//! Abstracts "run a shell command on the target host" so the deployment
//! orchestrator never talks to ssh directly. This keeps the state machine
//! testable against a scripted double and lets the production implementation
//! live in `remote`.

use std::path::Path;

use crate::error::StevedoreResult;

/// Captured result of one remote command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best human-readable failure detail available
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "command exited non-zero".to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Trait for running commands against the deployment target host
///
/// `Err` means the command could not be run at all (connection or spawn
/// failure); a command that ran and exited non-zero comes back as
/// `Ok(CommandOutput { success: false, .. })`.
pub trait RemoteExecutor {
    /// Run a shell command as the deploy user
    fn run(&self, command: &str) -> StevedoreResult<CommandOutput>;

    /// Run a shell command with privileges (sudo)
    fn run_privileged(&self, command: &str) -> StevedoreResult<CommandOutput>;

    /// Check whether a path exists on the target host
    fn path_exists(&self, path: &str) -> bool;

    /// Copy a local file into a remote directory
    fn copy_file(&self, local: &Path, remote_dir: &str) -> StevedoreResult<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executor double for orchestrator tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    /// Records every call and answers from a small script.
    ///
    /// Commands are recorded with a channel prefix (`run:`, `sudo:`,
    /// `exists:`, `copy:`) so tests can assert exact sequences.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        calls: RefCell<Vec<String>>,
        /// Substrings that make a matching command report failure
        fail_on: Vec<String>,
        /// Substrings that make `copy_file` return an error
        copy_fails: bool,
        /// Remote paths reported as existing
        existing: HashSet<String>,
        /// Responses for `readlink` commands, keyed by path
        link_targets: HashMap<String, String>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(mut self, needle: &str) -> Self {
            self.fail_on.push(needle.to_string());
            self
        }

        pub fn with_failing_copy(mut self) -> Self {
            self.copy_fails = true;
            self
        }

        pub fn with_existing(mut self, path: &str) -> Self {
            self.existing.insert(path.to_string());
            self
        }

        pub fn with_link(mut self, path: &str, target: &str) -> Self {
            self.link_targets
                .insert(path.to_string(), target.to_string());
            self.existing.insert(path.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn saw(&self, needle: &str) -> bool {
            self.calls.borrow().iter().any(|c| c.contains(needle))
        }

        fn answer(&self, command: &str) -> CommandOutput {
            if self.fail_on.iter().any(|n| command.contains(n)) {
                return CommandOutput::failed("scripted failure");
            }
            if let Some(rest) = command.strip_prefix("readlink ") {
                let path = rest.trim_matches('\'');
                if let Some(target) = self.link_targets.get(path) {
                    return CommandOutput::ok(format!("{target}\n"));
                }
            }
            CommandOutput::ok("")
        }
    }

    impl RemoteExecutor for ScriptedExecutor {
        fn run(&self, command: &str) -> StevedoreResult<CommandOutput> {
            self.calls.borrow_mut().push(format!("run: {command}"));
            Ok(self.answer(command))
        }

        fn run_privileged(&self, command: &str) -> StevedoreResult<CommandOutput> {
            self.calls.borrow_mut().push(format!("sudo: {command}"));
            Ok(self.answer(command))
        }

        fn path_exists(&self, path: &str) -> bool {
            self.calls.borrow_mut().push(format!("exists: {path}"));
            self.existing.contains(path)
        }

        fn copy_file(&self, local: &Path, remote_dir: &str) -> StevedoreResult<()> {
            self.calls
                .borrow_mut()
                .push(format!("copy: {} -> {remote_dir}", local.display()));
            if self.copy_fails {
                return Err(crate::error::StevedoreError::TransferFailed(
                    "scripted transfer failure".to_string(),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_detail_prefers_stderr() {
        let out = CommandOutput::failed("tar: short read\n");
        assert_eq!(out.failure_detail(), "tar: short read");
    }

    #[test]
    fn failure_detail_falls_back_when_stderr_empty() {
        let out = CommandOutput::failed("");
        assert_eq!(out.failure_detail(), "command exited non-zero");
    }
}
