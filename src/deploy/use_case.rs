//! Deployment state machine
//!
//! Linear sequence with abort-on-failure at every gate. Steps marked
//! best-effort (config-management disable, stale-path purge, symlink
//! rotation, bundle cleanup) log a warning and continue: they are
//! idempotent rotation/cleanup work that a later deploy or an operator can
//! recover. Everything else aborts the run, leaving the host for operator
//! inspection; after a failed health gate the proxy is intentionally left
//! stopped so an unhealthy backend is never exposed.

use crate::config::DeployConfig;
use crate::error::{StevedoreError, StevedoreResult};
use crate::events::{DeployEvent, DeployEventSink};
use crate::executor::{CommandOutput, RemoteExecutor};
use crate::health::HealthCheckReport;
use crate::remote::shell_quote;

use super::options::DeployOptions;
use super::result::DeployOutcome;

/// Port for the health-gate step
///
/// The production implementation opens an SSH tunnel and probes through it;
/// tests substitute a canned verdict.
pub trait HealthGate {
    fn verify(&self, config: &DeployConfig, events: &dyn DeployEventSink) -> HealthCheckReport;
}

/// One deployment run against one host
pub struct Deployment<'a> {
    config: &'a DeployConfig,
    executor: &'a dyn RemoteExecutor,
    gate: &'a dyn HealthGate,
    events: &'a dyn DeployEventSink,
}

impl<'a> Deployment<'a> {
    pub fn new(
        config: &'a DeployConfig,
        executor: &'a dyn RemoteExecutor,
        gate: &'a dyn HealthGate,
        events: &'a dyn DeployEventSink,
    ) -> Self {
        Self {
            config,
            executor,
            gate,
            events,
        }
    }

    /// Run the whole deployment
    pub fn execute(&self, options: &DeployOptions) -> StevedoreResult<DeployOutcome> {
        // Validation happens before any remote action
        self.config.validate()?;

        let mut outcome = DeployOutcome::new();
        self.events.on_event(DeployEvent::Started {
            host: self.config.host.clone(),
            bundle: self.config.bundle_file.clone(),
        });

        self.best_effort(
            "disable configuration management",
            "puppetd --disable",
            true,
            &mut outcome,
        );

        self.required(
            "stop front-end proxy",
            format!("service {} stop", self.config.proxy_service),
            true,
        )?;
        self.required(
            "stop application server",
            format!("service {} stop", self.config.app_service),
            true,
        )?;

        self.transfer_bundle()?;
        self.purge_stale_path(&mut outcome);
        self.extract_bundle()?;
        self.rotate_symlinks(&mut outcome);
        self.point_current()?;
        self.mark_executable()?;
        self.cleanup_bundle(&mut outcome);

        self.required(
            "start application server",
            format!("service {} start", self.config.app_service),
            true,
        )?;

        self.await_warmup();

        if options.do_health_check {
            let report = self.gate.verify(self.config, self.events);
            let healthy = report.healthy;
            let attempts = report.attempts;
            outcome.health = Some(report);
            if !healthy {
                // Proxy stays stopped and configuration management stays
                // disabled: never expose an unhealthy backend
                return Err(StevedoreError::HealthCheckFailed {
                    path: self.config.health_check_path.clone(),
                    attempts,
                });
            }
        } else {
            self.events.on_event(DeployEvent::HealthCheckSkipped);
        }

        self.required(
            "start front-end proxy",
            format!("service {} start", self.config.proxy_service),
            true,
        )?;
        outcome.proxy_started = true;

        self.best_effort(
            "re-enable configuration management",
            "puppetd --enable",
            true,
            &mut outcome,
        );
        outcome.puppet_reenabled = true;

        self.events.on_event(DeployEvent::Completed {
            proxy_started: true,
        });
        Ok(outcome)
    }

    /// Copy the bundle archive into the remote bundles directory
    fn transfer_bundle(&self) -> StevedoreResult<()> {
        self.events.on_event(DeployEvent::Step {
            name: "transfer bundle",
        });
        let local = self.config.local_bundle_path();
        self.executor
            .copy_file(&local, &self.config.bundles_dir)
            .map_err(|e| StevedoreError::TransferFailed(e.to_string()))?;
        self.events.on_event(DeployEvent::BundleCopied {
            local: local.display().to_string(),
            remote: self.config.remote_bundle_path(),
        });
        Ok(())
    }

    /// Remove a leftover directory with the target extracted name
    fn purge_stale_path(&self, outcome: &mut DeployOutcome) {
        let new_dir = self.config.new_deploy_dir();
        if !self.executor.path_exists(&new_dir) {
            return;
        }
        self.events.on_event(DeployEvent::StalePathPurged {
            path: new_dir.clone(),
        });
        self.best_effort(
            "purge stale deploy directory",
            &format!("rm -rf {}", shell_quote(&new_dir)),
            false,
            outcome,
        );
    }

    /// Untar the bundle into the deploys directory
    fn extract_bundle(&self) -> StevedoreResult<()> {
        self.required(
            "extract bundle",
            format!(
                "cd {} && tar -xf {}",
                shell_quote(&self.config.deploys_dir),
                shell_quote(&self.config.remote_bundle_path()),
            ),
            false,
        )?;
        Ok(())
    }

    /// Re-point `previous` at whatever `current` points at now.
    ///
    /// Absence of `current` means a first-ever deploy: nothing to rotate,
    /// not an error. Rotation failures are warnings; `current` is rewritten
    /// in the next step regardless.
    fn rotate_symlinks(&self, outcome: &mut DeployOutcome) {
        let current = &self.config.current_symlink;
        let previous = &self.config.previous_symlink;

        if !self.executor.path_exists(current) {
            return;
        }

        let old_target = match self.executor.run(&format!("readlink {}", shell_quote(current))) {
            Ok(out) if out.success => out.stdout.trim().to_string(),
            Ok(out) => {
                self.warn(outcome, "rotate symlinks", out.failure_detail());
                return;
            }
            Err(e) => {
                self.warn(outcome, "rotate symlinks", e.to_string());
                return;
            }
        };

        self.best_effort(
            "remove current symlink",
            &format!("rm {}", shell_quote(current)),
            false,
            outcome,
        );
        if self.executor.path_exists(previous) {
            self.best_effort(
                "remove previous symlink",
                &format!("rm {}", shell_quote(previous)),
                false,
                outcome,
            );
        }
        self.best_effort(
            "create previous symlink",
            &format!(
                "ln -s {} {}",
                shell_quote(&old_target),
                shell_quote(previous)
            ),
            false,
            outcome,
        );

        self.events.on_event(DeployEvent::SymlinkRotated {
            previous_target: old_target,
        });
    }

    /// Point `current` at the freshly extracted deploy directory
    fn point_current(&self) -> StevedoreResult<()> {
        let new_dir = self.config.new_deploy_dir();
        self.required(
            "create current symlink",
            format!(
                "ln -s {} {}",
                shell_quote(&new_dir),
                shell_quote(&self.config.current_symlink)
            ),
            false,
        )?;
        self.events
            .on_event(DeployEvent::CurrentPointed { target: new_dir });
        Ok(())
    }

    /// chmod the launcher scripts under the active deploy's runtime bin dir
    fn mark_executable(&self) -> StevedoreResult<()> {
        self.required(
            "mark launcher scripts executable",
            format!(
                "cd {} && chmod ug+x *.sh",
                shell_quote(&self.config.runtime_bin_path())
            ),
            false,
        )?;
        Ok(())
    }

    /// Remove the transferred archive from the remote bundles directory
    fn cleanup_bundle(&self, outcome: &mut DeployOutcome) {
        let bundle = self.config.remote_bundle_path();
        if !self.executor.path_exists(&bundle) {
            return;
        }
        self.best_effort(
            "remove transferred bundle",
            &format!("rm {}", shell_quote(&bundle)),
            false,
            outcome,
        );
    }

    /// Unconditional fixed wait for application-server initialization
    fn await_warmup(&self) {
        self.events.on_event(DeployEvent::WarmupStarted {
            secs: self.config.warmup.as_secs(),
        });
        std::thread::sleep(self.config.warmup);
        self.events.on_event(DeployEvent::WarmupFinished);
    }

    /// Run a step whose failure aborts the deployment
    fn required(
        &self,
        step: &'static str,
        command: String,
        privileged: bool,
    ) -> StevedoreResult<CommandOutput> {
        self.events.on_event(DeployEvent::Step { name: step });
        let output = if privileged {
            self.executor.run_privileged(&command)?
        } else {
            self.executor.run(&command)?
        };
        if !output.success {
            return Err(StevedoreError::RemoteCommandFailed {
                step: step.to_string(),
                detail: output.failure_detail(),
            });
        }
        Ok(output)
    }

    /// Run a step whose failure only produces a warning
    fn best_effort(
        &self,
        step: &'static str,
        command: &str,
        privileged: bool,
        outcome: &mut DeployOutcome,
    ) {
        self.events.on_event(DeployEvent::Step { name: step });
        let result = if privileged {
            self.executor.run_privileged(command)
        } else {
            self.executor.run(command)
        };
        match result {
            Ok(out) if out.success => {}
            Ok(out) => self.warn(outcome, step, out.failure_detail()),
            Err(e) => self.warn(outcome, step, e.to_string()),
        }
    }

    fn warn(&self, outcome: &mut DeployOutcome, step: &'static str, detail: String) {
        self.events.on_event(DeployEvent::StepWarning {
            name: step,
            detail: detail.clone(),
        });
        outcome.add_warning(format!("{step}: {detail}"));
    }
}
