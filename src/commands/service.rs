//! Service and configuration-management control commands
//!
//! The same individual operations the deploy runs, exposed for manual use.

use std::path::Path;

use anyhow::Result;

use stevedore::{RemoteExecutor, Settings, SshExecutor};

use crate::cli::{PuppetAction, ServiceAction, ServiceUnit};

pub fn cmd_service(
    config_path: &Path,
    action: ServiceAction,
    unit: ServiceUnit,
    host: &str,
    user: Option<&str>,
) -> Result<()> {
    let settings = Settings::load_or_default(config_path)?;
    let service = match unit {
        ServiceUnit::App => &settings.app_service,
        ServiceUnit::Proxy => &settings.proxy_service,
    };
    let (verb, gerund) = match action {
        ServiceAction::Start => ("start", "Starting"),
        ServiceAction::Stop => ("stop", "Stopping"),
    };

    println!("{gerund} {service}");
    run_privileged(&settings, host, user, &format!("service {service} {verb}"))
}

pub fn cmd_puppet(
    config_path: &Path,
    action: PuppetAction,
    host: &str,
    user: Option<&str>,
) -> Result<()> {
    let settings = Settings::load_or_default(config_path)?;
    let flag = match action {
        PuppetAction::Enable => "--enable",
        PuppetAction::Disable => "--disable",
    };

    println!(
        "{} configuration management",
        match action {
            PuppetAction::Enable => "Enabling",
            PuppetAction::Disable => "Disabling",
        }
    );
    run_privileged(&settings, host, user, &format!("puppetd {flag}"))
}

fn run_privileged(
    settings: &Settings,
    host: &str,
    user: Option<&str>,
    command: &str,
) -> Result<()> {
    let user = user.unwrap_or(&settings.remote_user);
    let executor = SshExecutor::new(user, host);
    let output = executor.run_privileged(command)?;
    if !output.success {
        anyhow::bail!("'{command}' on {host} failed: {}", output.failure_detail());
    }
    if !output.stdout.trim().is_empty() {
        println!("{}", output.stdout.trim_end());
    }
    Ok(())
}
