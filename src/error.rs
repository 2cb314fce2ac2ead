//! Error types for Stevedore
//!
//! Uses `thiserror` for library errors; the binary side wraps these in
//! `anyhow` at the command boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Stevedore operations
pub type StevedoreResult<T> = Result<T, StevedoreError>;

/// Main error type for Stevedore operations
#[derive(Error, Debug)]
pub enum StevedoreError {
    /// Required deploy parameter missing or empty (checked before any remote action)
    #[error("invalid deploy parameters: {0}")]
    Validation(String),

    /// A required remote command returned non-zero
    #[error("remote command failed while trying to {step}: {detail}")]
    RemoteCommandFailed { step: String, detail: String },

    /// Bundle copy to the remote host failed
    #[error("bundle transfer failed: {0}")]
    TransferFailed(String),

    /// SSH port forward never reported ready within the timeout
    #[error("SSH tunnel to {dest} did not establish within {timeout_secs}s")]
    TunnelTimeout { dest: String, timeout_secs: u64 },

    /// Application never reported healthy within the bounded attempts
    #[error("health check against {path} failed after {attempts} attempt(s)")]
    HealthCheckFailed { path: String, attempts: u32 },

    /// Configuration file was present but unreadable or malformed
    #[error("invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = StevedoreError::Validation("bundle file name is not set".to_string());
        assert_eq!(
            err.to_string(),
            "invalid deploy parameters: bundle file name is not set"
        );
    }

    #[test]
    fn test_error_display_tunnel_timeout() {
        let err = StevedoreError::TunnelTimeout {
            dest: "app01:8080".to_string(),
            timeout_secs: 15,
        };
        assert_eq!(
            err.to_string(),
            "SSH tunnel to app01:8080 did not establish within 15s"
        );
    }

    #[test]
    fn test_error_display_remote_command_failed() {
        let err = StevedoreError::RemoteCommandFailed {
            step: "stop front-end proxy".to_string(),
            detail: "exit code 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "remote command failed while trying to stop front-end proxy: exit code 1"
        );
    }
}
