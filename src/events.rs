//! Deploy Event Port
//!
//! Observable interface for deployment runs. The orchestrator and health
//! checker emit events; sinks render them as console status lines or NDJSON
//! for scripting. Keeps presentation out of the state machine.

use std::io::Write;

/// Event emitted during a deployment run
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Deployment started
    Started { host: String, bundle: String },

    /// A required step is about to run
    Step { name: &'static str },

    /// A best-effort step failed; the run continues
    StepWarning { name: &'static str, detail: String },

    /// Bundle archive landed on the remote host
    BundleCopied { local: String, remote: String },

    /// A stale directory with the target name was removed
    StalePathPurged { path: String },

    /// `previous` now points at the old `current` target
    SymlinkRotated { previous_target: String },

    /// `current` now points at the new deploy directory
    CurrentPointed { target: String },

    /// Fixed warmup wait started
    WarmupStarted { secs: u64 },
    WarmupFinished,

    /// SSH tunnel for the health check is up
    TunnelEstablished { entrance: String },

    /// SSH tunnel could not be established; counts as a failed check
    TunnelFailed { error: String },

    /// One health probe attempt
    HealthProbeStarted { attempt: u32 },
    HealthProbeRetry { attempt: u32, reason: String },
    HealthProbeSucceeded { attempt: u32 },

    /// No health-check host configured; probe skipped entirely
    HealthCheckSkipped,

    /// Deployment finished; proxy is up
    Completed { proxy_started: bool },
}

/// Trait for receiving deploy events
pub trait DeployEventSink {
    fn on_event(&self, event: DeployEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {
        // Do nothing
    }
}

/// Current time formatted the way status lines report it (GMT)
pub fn current_time_gmt() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S +0000")
        .to_string()
}

/// Console sink: human-readable status lines on stdout
pub struct ConsoleEventSink {
    verbose: u8,
}

impl ConsoleEventSink {
    pub fn new(verbose: u8) -> Self {
        Self { verbose }
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        match event {
            DeployEvent::Started { host, bundle } => {
                println!("Starting deploy of {bundle} to {host}");
            }
            DeployEvent::Step { name } => {
                println!("→ {name}");
            }
            DeployEvent::StepWarning { name, detail } => {
                eprintln!("[!] {name}: {detail} (continuing)");
            }
            DeployEvent::BundleCopied { local, remote } => {
                println!("Copied bundle {local} to {remote}");
            }
            DeployEvent::StalePathPurged { path } => {
                println!("An identically named deploy '{path}' was found and deleted");
            }
            DeployEvent::SymlinkRotated { previous_target } => {
                println!("Moved 'current' deploy symlink to 'previous' ({previous_target})");
            }
            DeployEvent::CurrentPointed { target } => {
                println!("'current' now points at {target}");
            }
            DeployEvent::WarmupStarted { secs } => {
                println!(
                    "Waiting {:.1} minutes while the application server starts",
                    secs as f64 / 60.0
                );
                println!("Warmup started at: {}", current_time_gmt());
            }
            DeployEvent::WarmupFinished => {
                println!("Warmup completed at: {}", current_time_gmt());
            }
            DeployEvent::TunnelEstablished { entrance } => {
                println!("Health-check tunnel up at {entrance}");
            }
            DeployEvent::TunnelFailed { error } => {
                eprintln!("[!] health-check tunnel failed: {error}");
            }
            DeployEvent::HealthProbeStarted { attempt } => {
                println!("Running health check, attempt {attempt} ...");
            }
            DeployEvent::HealthProbeRetry { attempt, reason } => {
                if self.verbose > 0 {
                    println!("Attempt {attempt}: {reason}");
                } else {
                    println!("Attempt {attempt}: not healthy yet");
                }
            }
            DeployEvent::HealthProbeSucceeded { attempt } => {
                println!("Attempt {attempt}: application reports UP");
            }
            DeployEvent::HealthCheckSkipped => {
                println!("Skipping health checks");
            }
            DeployEvent::Completed { proxy_started } => {
                if proxy_started {
                    println!("Startup successful");
                }
            }
        }
    }
}

/// JSON sink: one NDJSON object per event on stdout
pub struct JsonEventSink;

impl JsonEventSink {
    fn write(value: &serde_json::Value) {
        let mut out = std::io::stdout().lock();
        if let Ok(line) = serde_json::to_string(value) {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        let value = match event {
            DeployEvent::Started { host, bundle } => serde_json::json!({
                "event": "started", "host": host, "bundle": bundle,
            }),
            DeployEvent::Step { name } => serde_json::json!({
                "event": "step", "name": name,
            }),
            DeployEvent::StepWarning { name, detail } => serde_json::json!({
                "event": "step_warning", "name": name, "detail": detail,
            }),
            DeployEvent::BundleCopied { local, remote } => serde_json::json!({
                "event": "bundle_copied", "local": local, "remote": remote,
            }),
            DeployEvent::StalePathPurged { path } => serde_json::json!({
                "event": "stale_path_purged", "path": path,
            }),
            DeployEvent::SymlinkRotated { previous_target } => serde_json::json!({
                "event": "symlink_rotated", "previous_target": previous_target,
            }),
            DeployEvent::CurrentPointed { target } => serde_json::json!({
                "event": "current_pointed", "target": target,
            }),
            DeployEvent::WarmupStarted { secs } => serde_json::json!({
                "event": "warmup_started", "secs": secs,
            }),
            DeployEvent::WarmupFinished => serde_json::json!({
                "event": "warmup_finished",
            }),
            DeployEvent::TunnelEstablished { entrance } => serde_json::json!({
                "event": "tunnel_established", "entrance": entrance,
            }),
            DeployEvent::TunnelFailed { error } => serde_json::json!({
                "event": "tunnel_failed", "error": error,
            }),
            DeployEvent::HealthProbeStarted { attempt } => serde_json::json!({
                "event": "health_probe_started", "attempt": attempt,
            }),
            DeployEvent::HealthProbeRetry { attempt, reason } => serde_json::json!({
                "event": "health_probe_retry", "attempt": attempt, "reason": reason,
            }),
            DeployEvent::HealthProbeSucceeded { attempt } => serde_json::json!({
                "event": "health_probe_succeeded", "attempt": attempt,
            }),
            DeployEvent::HealthCheckSkipped => serde_json::json!({
                "event": "health_check_skipped",
            }),
            DeployEvent::Completed { proxy_started } => serde_json::json!({
                "event": "completed", "proxy_started": proxy_started,
            }),
        };
        Self::write(&value);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Test event sink that records all events
    #[derive(Default)]
    pub struct RecordingEventSink {
        events: RefCell<Vec<DeployEvent>>,
    }

    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<DeployEvent> {
            self.events.borrow().clone()
        }
    }

    impl DeployEventSink for RecordingEventSink {
        fn on_event(&self, event: DeployEvent) {
            self.events.borrow_mut().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingEventSink;
    use super::*;

    #[test]
    fn recording_sink_captures_events() {
        let sink = RecordingEventSink::new();

        sink.on_event(DeployEvent::Started {
            host: "app01".to_string(),
            bundle: "bundle.tar".to_string(),
        });
        sink.on_event(DeployEvent::Step {
            name: "stop front-end proxy",
        });

        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn gmt_timestamp_has_expected_shape() {
        let stamp = current_time_gmt();
        assert!(stamp.ends_with("+0000"));
        assert_eq!(stamp.matches(':').count(), 2);
    }
}
