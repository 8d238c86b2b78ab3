//! Environment-driven harness configuration.
//!
//! Everything is read once from the environment with logged fallbacks;
//! there is no configuration file.

use std::path::PathBuf;

use tracing::{debug, warn};

/// Default name of the external cluster client binary
pub const DEFAULT_BINARY: &str = "oc";

/// Harness configuration resolved from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path or name of the cluster client binary (`OC_BINARY`)
    pub binary: String,
    /// Kubeconfig for the unprivileged session (`KUBECONFIG`)
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig for admin operations (`ADMIN_KUBECONFIG`, falls back
    /// to `KUBECONFIG`)
    pub admin_kubeconfig: Option<PathBuf>,
    /// Where scan reports and rendered manifests are persisted
    /// (`ARTIFACT_DIR`)
    pub artifact_dir: PathBuf,
}

impl Config {
    /// Resolve the configuration from the environment.
    pub fn from_env() -> Self {
        let binary = std::env::var("OC_BINARY").unwrap_or_else(|_| {
            debug!("OC_BINARY not set, using '{}'", DEFAULT_BINARY);
            DEFAULT_BINARY.to_string()
        });

        let kubeconfig = std::env::var_os("KUBECONFIG").map(PathBuf::from);
        let admin_kubeconfig = std::env::var_os("ADMIN_KUBECONFIG")
            .map(PathBuf::from)
            .or_else(|| kubeconfig.clone());

        let artifact_dir = match std::env::var_os("ARTIFACT_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                warn!("ARTIFACT_DIR not set, using system temp dir");
                std::env::temp_dir()
            }
        };

        Self {
            binary,
            kubeconfig,
            admin_kubeconfig,
            artifact_dir,
        }
    }
}
