//! Deploy command entry point

use std::path::Path;

use anyhow::Result;

use stevedore::{
    ConsoleEventSink, DeployConfig, DeployEventSink, DeployOptions, Deployment, JsonEventSink,
    Settings, SshExecutor, TunnelledHealthGate,
};

#[allow(clippy::too_many_arguments)]
pub fn cmd_deploy(
    config_path: &Path,
    host: &str,
    user: Option<&str>,
    bundle: &str,
    extracted: &str,
    health_check: bool,
    remote_server: Option<&str>,
    json: bool,
    verbose: u8,
) -> Result<()> {
    let settings = Settings::load_or_default(config_path)?;
    let config = DeployConfig::new(&settings, host, user, bundle, extracted, remote_server);

    if !json {
        println!("Current user: {}", config.remote_user);
    }

    let executor = SshExecutor::new(&config.remote_user, &config.host);
    let sink: Box<dyn DeployEventSink> = if json {
        Box::new(JsonEventSink)
    } else {
        Box::new(ConsoleEventSink::new(verbose))
    };

    let deployment = Deployment::new(&config, &executor, &TunnelledHealthGate, sink.as_ref());
    let outcome = deployment.execute(&DeployOptions {
        do_health_check: health_check,
    })?;

    if !json {
        if outcome.has_warnings() {
            eprintln!();
            eprintln!("Completed with {} warning(s):", outcome.warnings.len());
            for warning in &outcome.warnings {
                eprintln!("  [!] {warning}");
            }
        }
        println!();
        println!("Deploy of {} to {} complete", config.bundle_file, config.host);
    }

    Ok(())
}
