//! Deployment run outcome

use crate::health::HealthCheckReport;

/// What a successful deployment run did
///
/// Failures surface as errors from `Deployment::execute`; this records the
/// non-fatal noise of a run that went through.
#[derive(Debug, Clone, Default)]
pub struct DeployOutcome {
    /// Best-effort steps that failed without aborting the run
    pub warnings: Vec<String>,
    /// Health-check result, if a check ran
    pub health: Option<HealthCheckReport>,
    /// Whether the front-end proxy was started
    pub proxy_started: bool,
    /// Whether configuration management was re-enabled
    pub puppet_reenabled: bool,
}

impl DeployOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
