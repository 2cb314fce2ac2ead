//! Application health probing
//!
//! Probes the deployed application's self-reported status page through the
//! local end of an SSH tunnel. Each attempt yields an explicit outcome
//! (healthy / retryable), the loop is bounded, and probe failures are data,
//! never propagated errors: one flaky attempt must not abort the check.

use std::time::Duration;

use regex::Regex;

use crate::config::DeployConfig;
use crate::deploy::HealthGate;
use crate::events::{DeployEvent, DeployEventSink};
use crate::tunnel::SshTunnel;

/// Marker the status page must carry; the token inside the span decides
const STATUS_MARKER: &str = r#"ENVIRONMENT STATUS: <span class="success">(.*?)</span>"#;

const MAX_ATTEMPTS: u32 = 3;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single probe attempt
enum Probe {
    Healthy,
    Retry(String),
}

/// Outcome of a whole health check
#[derive(Debug, Clone)]
pub struct HealthCheckReport {
    pub healthy: bool,
    /// HTTP attempts consumed; zero when the check was skipped
    pub attempts: u32,
}

/// Bounded HTTP health checker
pub struct HealthChecker {
    path: String,
    marker: Regex,
    max_attempts: u32,
    probe_timeout: Duration,
}

impl HealthChecker {
    pub fn new(path: &str) -> Self {
        Self::with_limits(path, MAX_ATTEMPTS, PROBE_TIMEOUT)
    }

    /// Checker with non-default bounds (tests shrink these)
    pub fn with_limits(path: &str, max_attempts: u32, probe_timeout: Duration) -> Self {
        let marker =
            Regex::new(&format!("(?i){STATUS_MARKER}")).expect("status marker pattern is valid");
        Self {
            path: path.to_string(),
            marker,
            max_attempts,
            probe_timeout,
        }
    }

    /// Probe the application through the local tunnel port.
    ///
    /// `target` absent means no check was requested: report failure with
    /// zero attempts, distinct from a check that ran and failed. Once
    /// tunneled, only the local port matters for the connection target.
    pub fn check(
        &self,
        target: Option<&str>,
        local_port: u16,
        events: &dyn DeployEventSink,
    ) -> HealthCheckReport {
        if target.is_none() {
            events.on_event(DeployEvent::HealthCheckSkipped);
            return HealthCheckReport {
                healthy: false,
                attempts: 0,
            };
        }

        let url = format!("http://127.0.0.1:{}{}", local_port, self.path);

        for attempt in 1..=self.max_attempts {
            events.on_event(DeployEvent::HealthProbeStarted { attempt });
            match self.probe(&url) {
                Probe::Healthy => {
                    events.on_event(DeployEvent::HealthProbeSucceeded { attempt });
                    return HealthCheckReport {
                        healthy: true,
                        attempts: attempt,
                    };
                }
                Probe::Retry(reason) => {
                    events.on_event(DeployEvent::HealthProbeRetry { attempt, reason });
                }
            }
        }

        HealthCheckReport {
            healthy: false,
            attempts: self.max_attempts,
        }
    }

    fn probe(&self, url: &str) -> Probe {
        let client = match reqwest::blocking::Client::builder()
            .timeout(self.probe_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => return Probe::Retry(format!("client construction failed: {e}")),
        };

        let response = match client.get(url).send() {
            Ok(response) => response,
            Err(e) => return Probe::Retry(format!("connection error: {e}")),
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Probe::Retry(format!("unexpected status {status}"));
        }

        let body = match response.text() {
            Ok(body) => body,
            Err(e) => return Probe::Retry(format!("body read error: {e}")),
        };

        match self.marker.captures(&body) {
            // Tag matching is case-insensitive, the token itself is not
            Some(caps) if &caps[1] == "UP" => Probe::Healthy,
            Some(caps) => Probe::Retry(format!("application reports '{}'", &caps[1])),
            None => Probe::Retry("status marker not present in response".to_string()),
        }
    }
}

/// Production health gate: tunnel to the target, then probe through it.
///
/// A tunnel that never establishes counts as a failed check, not an error;
/// the orchestrator must still refuse to start the proxy.
pub struct TunnelledHealthGate;

impl HealthGate for TunnelledHealthGate {
    fn verify(&self, config: &DeployConfig, events: &dyn DeployEventSink) -> HealthCheckReport {
        let Some(target) = config.health_check_host.as_deref() else {
            events.on_event(DeployEvent::HealthCheckSkipped);
            return HealthCheckReport {
                healthy: false,
                attempts: 0,
            };
        };

        let tunnel = match SshTunnel::open(
            &config.remote_user,
            &config.host,
            target,
            config.health_check_port,
            None,
            config.tunnel_timeout,
        ) {
            Ok(tunnel) => tunnel,
            Err(e) => {
                events.on_event(DeployEvent::TunnelFailed {
                    error: e.to_string(),
                });
                return HealthCheckReport {
                    healthy: false,
                    attempts: 0,
                };
            }
        };

        events.on_event(DeployEvent::TunnelEstablished {
            entrance: tunnel.entrance(),
        });

        let checker = HealthChecker::new(&config.health_check_path);
        let report = checker.check(Some(target), tunnel.local_port(), events);
        tunnel.close();
        report
    }
}
