//! Per-run deployment options

/// Options controlling a single deployment run
///
/// Everything describing *what* is deployed lives in `DeployConfig`; these
/// are the switches for *how* this run behaves.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Gate the proxy restart behind a health check
    pub do_health_check: bool,
}
