//! Standalone health-check command

use std::path::Path;

use anyhow::Result;

use stevedore::{
    ConsoleEventSink, DeployConfig, DeployEventSink, HealthGate, JsonEventSink, Settings,
    TunnelledHealthGate,
};

pub fn cmd_health_check(
    config_path: &Path,
    host: &str,
    user: Option<&str>,
    remote_server: &str,
    json: bool,
    verbose: u8,
) -> Result<()> {
    let settings = Settings::load_or_default(config_path)?;
    // Bundle names are irrelevant to a standalone check
    let config = DeployConfig::new(&settings, host, user, "", "", Some(remote_server));

    let sink: Box<dyn DeployEventSink> = if json {
        Box::new(JsonEventSink)
    } else {
        Box::new(ConsoleEventSink::new(verbose))
    };

    let report = TunnelledHealthGate.verify(&config, sink.as_ref());

    if !json {
        println!(
            "Health check {} after {} attempt(s)",
            if report.healthy { "passed" } else { "failed" },
            report.attempts
        );
    }

    if !report.healthy {
        anyhow::bail!(
            "application on {} did not report healthy",
            config.health_check_host.as_deref().unwrap_or(host)
        );
    }
    Ok(())
}
