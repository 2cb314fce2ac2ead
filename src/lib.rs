//! Stevedore - blue/green bundle deployment driver
//!
//! Stevedore automates deploying a server application bundle to a single
//! remote host: stop services, transfer and unpack the bundle, atomically
//! rotate the `current`/`previous` symlinks, restart services, and
//! optionally gate the front-end proxy restart behind a health check made
//! through an ephemeral SSH tunnel.

pub mod config;
pub mod deploy;
pub mod error;
pub mod events;
pub mod executor;
pub mod health;
pub mod remote;
pub mod tunnel;

// Re-exports for convenience
pub use config::{DeployConfig, Settings};
pub use deploy::{DeployOptions, DeployOutcome, Deployment, HealthGate};
pub use error::{StevedoreError, StevedoreResult};
pub use events::{ConsoleEventSink, DeployEvent, DeployEventSink, JsonEventSink, NoopEventSink};
pub use executor::{CommandOutput, RemoteExecutor};
pub use health::{HealthCheckReport, HealthChecker, TunnelledHealthGate};
pub use remote::SshExecutor;
pub use tunnel::SshTunnel;
