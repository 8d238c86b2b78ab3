//! Subprocess client for the external cluster binary.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use super::action::{ActionRunner, Privilege, Scope};
use crate::config::Config;
use crate::error::{Error, Result};

/// Handle on the external cluster client.
///
/// Holds the binary path, the kubeconfigs for both privilege levels and
/// an optional session namespace. Cloning is cheap; each test derives a
/// namespace-bound clone via [`Cli::with_namespace`].
#[derive(Clone, Debug)]
pub struct Cli {
    binary: String,
    kubeconfig: Option<PathBuf>,
    admin_kubeconfig: Option<PathBuf>,
    namespace: Option<String>,
}

impl Cli {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.binary.clone(),
            kubeconfig: config.kubeconfig.clone(),
            admin_kubeconfig: config.admin_kubeconfig.clone(),
            namespace: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(&Config::from_env())
    }

    /// Bind this client to a namespace for `Scope::Namespaced` actions.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run one action with borrowed arguments.
    pub async fn run(
        &self,
        verb: &str,
        privilege: Privilege,
        scope: Scope,
        args: &[&str],
    ) -> Result<String> {
        self.run_action(verb, privilege, scope, &super::action::to_args(args))
            .await
    }

    /// Assemble the argument vector for one invocation.
    ///
    /// The four privilege/scope combinations mirror the calling
    /// conventions of the external client: the admin kubeconfig (when
    /// configured) is selected up front, and namespaced actions get the
    /// session namespace appended as `-n`.
    pub(crate) fn command_line(
        &self,
        verb: &str,
        privilege: Privilege,
        scope: Scope,
        args: &[String],
    ) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 4);
        let kubeconfig = match privilege {
            Privilege::Admin => {
                if self.admin_kubeconfig.is_none() {
                    debug!("no admin kubeconfig configured, using ambient context");
                }
                self.admin_kubeconfig.as_ref()
            }
            Privilege::User => self.kubeconfig.as_ref(),
        };
        if let Some(path) = kubeconfig {
            argv.push(format!("--kubeconfig={}", path.display()));
        }
        argv.push(verb.to_string());
        argv.extend(args.iter().cloned());
        match scope {
            Scope::ClusterWide => {}
            Scope::Namespaced => {
                if let Some(ns) = &self.namespace {
                    argv.push("-n".to_string());
                    argv.push(ns.clone());
                } else {
                    debug!("namespaced action without a session namespace");
                }
            }
        }
        argv
    }

    /// Spawn the binary and capture its output.
    ///
    /// A non-zero exit becomes `Error::Command` carrying combined stdout
    /// and stderr so callers can classify by content.
    pub(crate) async fn exec(&self, argv: &[String]) -> Result<String> {
        let rendered = format!("{} {}", self.binary, argv.join(" "));
        trace!(command = %rendered, "running");

        let output = Command::new(&self.binary)
            .args(argv)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            debug!(command = %rendered, "succeeded");
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let combined = match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout,
            _ => stderr,
        };
        Err(Error::Command {
            command: rendered,
            code: output.status.code(),
            output: combined,
        })
    }
}

impl ActionRunner for Cli {
    async fn run_action(
        &self,
        verb: &str,
        privilege: Privilege,
        scope: Scope,
        args: &[String],
    ) -> Result<String> {
        let argv = self.command_line(verb, privilege, scope, args);
        self.exec(&argv).await
    }
}
