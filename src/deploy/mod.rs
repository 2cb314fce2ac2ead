//! Deployment orchestration
//!
//! The linear abort-on-failure state machine that drives a whole deployment
//! run: stop services, transfer and unpack the bundle, rotate the
//! current/previous symlinks, restart services, and gate the proxy restart
//! behind an optional health check.

mod options;
mod result;
mod use_case;


pub use options::DeployOptions;
pub use result::DeployOutcome;
pub use use_case::{Deployment, HealthGate};
