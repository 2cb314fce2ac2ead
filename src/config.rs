//! Deployment configuration
//!
//! Settings come from an optional `stevedore.toml` with serde defaults for
//! every field. A `DeployConfig` is built once per run from those settings
//! plus the command-line arguments, and is immutable afterwards: every
//! component receives a reference, no process-wide state exists.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StevedoreError, StevedoreResult};

/// File-level settings (`stevedore.toml`)
///
/// Everything has a default, so a missing file resolves to a usable
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default remote user for SSH connections
    pub remote_user: String,
    /// Port the application listens on for health checks
    pub health_check_port: u16,
    /// Install root on the remote host; symlinks and directories derive from it
    pub install_root: String,
    /// Local directory holding bundle archives
    pub local_bundles_dir: PathBuf,
    /// URL path probed during health checks
    pub health_check_path: String,
    /// Fixed warmup wait after the application server starts, in seconds
    pub warmup_secs: u64,
    /// SSH tunnel establishment timeout, in seconds
    pub tunnel_timeout_secs: u64,
    /// Service unit name of the application server
    pub app_service: String,
    /// Service unit name of the front-end proxy
    pub proxy_service: String,
    /// Subdirectory under `current` whose launcher scripts get chmod'ed
    pub runtime_bin_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_user: "root".to_string(),
            health_check_port: 8080,
            install_root: "/opt/app".to_string(),
            local_bundles_dir: PathBuf::from("/srv/deploys/app"),
            health_check_path: "/web/health/check.jsp".to_string(),
            warmup_secs: 300,
            tunnel_timeout_secs: 15,
            app_service: "app".to_string(),
            proxy_service: "apache2".to_string(),
            runtime_bin_dir: "tomcat/bin".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> StevedoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| StevedoreError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings, falling back to defaults when the file is absent
    ///
    /// A present-but-malformed file is still an error; silently ignoring it
    /// would deploy with the wrong paths.
    pub fn load_or_default(path: &Path) -> StevedoreResult<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Immutable per-run deployment configuration
///
/// Derived paths are computed exactly once, at construction.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// SSH target host
    pub host: String,
    /// Remote user (CLI override or `Settings::remote_user`)
    pub remote_user: String,
    /// Host the health check is made against; `None` means no check requested
    pub health_check_host: Option<String>,
    pub health_check_port: u16,
    pub health_check_path: String,
    /// `<install_root>/current`
    pub current_symlink: String,
    /// `<install_root>/previous`
    pub previous_symlink: String,
    /// `<install_root>/deploys`
    pub deploys_dir: String,
    /// `<install_root>/bundles`
    pub bundles_dir: String,
    pub local_bundles_dir: PathBuf,
    /// Archive file name of the bundle to deploy
    pub bundle_file: String,
    /// Directory name the archive extracts to
    pub extracted_name: String,
    pub warmup: Duration,
    pub tunnel_timeout: Duration,
    pub app_service: String,
    pub proxy_service: String,
    pub runtime_bin_dir: String,
}

impl DeployConfig {
    /// Build a run configuration from settings and command-line arguments
    pub fn new(
        settings: &Settings,
        host: &str,
        user_override: Option<&str>,
        bundle_file: &str,
        extracted_name: &str,
        health_check_host: Option<&str>,
    ) -> Self {
        let root = settings.install_root.trim_end_matches('/');
        Self {
            host: host.to_string(),
            remote_user: user_override
                .map(str::to_string)
                .unwrap_or_else(|| settings.remote_user.clone()),
            health_check_host: health_check_host
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            health_check_port: settings.health_check_port,
            health_check_path: settings.health_check_path.clone(),
            current_symlink: format!("{root}/current"),
            previous_symlink: format!("{root}/previous"),
            deploys_dir: format!("{root}/deploys"),
            bundles_dir: format!("{root}/bundles"),
            local_bundles_dir: settings.local_bundles_dir.clone(),
            bundle_file: bundle_file.to_string(),
            extracted_name: extracted_name.to_string(),
            warmup: Duration::from_secs(settings.warmup_secs),
            tunnel_timeout: Duration::from_secs(settings.tunnel_timeout_secs),
            app_service: settings.app_service.clone(),
            proxy_service: settings.proxy_service.clone(),
            runtime_bin_dir: settings
                .runtime_bin_dir
                .trim_matches('/')
                .to_string(),
        }
    }

    /// Require the deploy parameters that must be present before any remote
    /// action runs
    pub fn validate(&self) -> StevedoreResult<()> {
        if self.bundle_file.is_empty() {
            return Err(StevedoreError::Validation(
                "bundle file name is not set".to_string(),
            ));
        }
        if self.extracted_name.is_empty() {
            return Err(StevedoreError::Validation(
                "bundle extracted name is not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Local path of the bundle archive to transfer
    pub fn local_bundle_path(&self) -> PathBuf {
        self.local_bundles_dir.join(&self.bundle_file)
    }

    /// Remote path the bundle lands at after transfer
    pub fn remote_bundle_path(&self) -> String {
        format!("{}/{}", self.bundles_dir, self.bundle_file)
    }

    /// Remote directory the bundle extracts into
    pub fn new_deploy_dir(&self) -> String {
        format!("{}/{}", self.deploys_dir, self.extracted_name)
    }

    /// Remote directory holding the launcher scripts of the active deploy
    pub fn runtime_bin_path(&self) -> String {
        format!("{}/{}", self.current_symlink, self.runtime_bin_dir)
    }
}
