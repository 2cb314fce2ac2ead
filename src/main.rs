//! Stevedore CLI - blue/green bundle deployment driver
//!
//! Usage: stevedore <COMMAND>
//!
//! Commands:
//!   deploy        Deploy a bundle to a remote host
//!   health-check  Run the tunnelled health check on its own
//!   service       Start or stop a managed service
//!   puppet        Enable or disable configuration management
//!   config        Print the resolved configuration

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            host,
            user,
            bundle,
            extracted,
            health_check,
            remote_server,
        } => commands::deploy::cmd_deploy(
            &cli.config,
            &host,
            user.as_deref(),
            &bundle,
            &extracted,
            health_check,
            remote_server.as_deref(),
            cli.json,
            cli.verbose,
        ),
        Commands::HealthCheck {
            host,
            user,
            remote_server,
        } => commands::health::cmd_health_check(
            &cli.config,
            &host,
            user.as_deref(),
            &remote_server,
            cli.json,
            cli.verbose,
        ),
        Commands::Service {
            action,
            unit,
            host,
            user,
        } => commands::service::cmd_service(&cli.config, action, unit, &host, user.as_deref()),
        Commands::Puppet { action, host, user } => {
            commands::service::cmd_puppet(&cli.config, action, &host, user.as_deref())
        }
        Commands::Config => commands::config::cmd_config(&cli.config, cli.json),
    }
}
