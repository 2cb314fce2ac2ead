use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Stevedore - blue/green bundle deployment driver
#[derive(Parser, Debug)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit NDJSON events instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the settings file
    #[arg(long, global = true, default_value = "stevedore.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a bundle to a remote host
    Deploy {
        /// Target host (ssh destination, resolved via ssh config)
        #[arg(short = 'H', long)]
        host: String,

        /// Remote user override
        #[arg(short, long)]
        user: Option<String>,

        /// Bundle archive file name under the local bundles directory
        #[arg(long)]
        bundle: String,

        /// Directory name the archive extracts to
        #[arg(long)]
        extracted: String,

        /// Gate the proxy restart behind a health check
        #[arg(long)]
        health_check: bool,

        /// Host the health check is made against (may equal HOST)
        #[arg(long)]
        remote_server: Option<String>,
    },

    /// Run the tunnelled health check on its own
    HealthCheck {
        /// Bridge host (ssh destination)
        #[arg(short = 'H', long)]
        host: String,

        /// Remote user override
        #[arg(short, long)]
        user: Option<String>,

        /// Host the health check is made against
        #[arg(long)]
        remote_server: String,
    },

    /// Start or stop a managed service on the remote host
    Service {
        #[arg(value_enum)]
        action: ServiceAction,

        #[arg(value_enum)]
        unit: ServiceUnit,

        /// Target host (ssh destination)
        #[arg(short = 'H', long)]
        host: String,

        /// Remote user override
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Enable or disable configuration management on the remote host
    Puppet {
        #[arg(value_enum)]
        action: PuppetAction,

        /// Target host (ssh destination)
        #[arg(short = 'H', long)]
        host: String,

        /// Remote user override
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Print the resolved configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ServiceAction {
    Start,
    Stop,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ServiceUnit {
    /// Application server
    App,
    /// Front-end proxy
    Proxy,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PuppetAction {
    Enable,
    Disable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_requires_bundle_and_extracted() {
        let result = Cli::try_parse_from(["stevedore", "deploy", "--host", "app01"]);
        assert!(result.is_err());
    }

    #[test]
    fn deploy_parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "stevedore",
            "deploy",
            "--host",
            "app01",
            "--bundle",
            "bundle-7.2.tar",
            "--extracted",
            "bundle-7.2",
            "--health-check",
            "--remote-server",
            "app01.internal",
        ])
        .unwrap();

        match cli.command {
            Commands::Deploy {
                host,
                bundle,
                extracted,
                health_check,
                remote_server,
                ..
            } => {
                assert_eq!(host, "app01");
                assert_eq!(bundle, "bundle-7.2.tar");
                assert_eq!(extracted, "bundle-7.2");
                assert!(health_check);
                assert_eq!(remote_server.as_deref(), Some("app01.internal"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
