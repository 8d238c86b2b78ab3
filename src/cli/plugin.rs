//! Wrapper for the external compliance plugin client.
//!
//! The plugin is invoked as a subcommand of the cluster client
//! (`<binary> compliance <operation> ...`) and always runs with admin
//! credentials, matching how the suite drives it.

use std::path::Path;

use super::action::{ActionRunner, Privilege, Scope, to_args};
use super::client::Cli;
use crate::error::Result;

/// Client for the compliance plugin operations.
pub struct ComplianceCli<'a> {
    cli: &'a Cli,
}

impl<'a> ComplianceCli<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    async fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        let mut owned = vec![operation.to_string()];
        owned.extend(to_args(args));
        self.cli
            .run_action("compliance", Privilege::Admin, Scope::ClusterWide, &owned)
            .await
    }

    /// Re-run the scans owned by a binding, suite or scan immediately.
    pub async fn rerun_now(&self, kind: &str, name: &str, namespace: &str) -> Result<String> {
        self.run("rerun-now", &[kind, name, "-n", namespace]).await
    }

    /// Create a ScanSettingBinding from profile/tailored-profile targets.
    ///
    /// `scan_setting` selects a non-default ScanSetting via `-S`.
    pub async fn bind(
        &self,
        name: &str,
        scan_setting: Option<&str>,
        targets: &[&str],
        namespace: &str,
    ) -> Result<String> {
        let mut args = vec!["-N", name];
        if let Some(setting) = scan_setting {
            args.push("-S");
            args.push(setting);
        }
        args.extend_from_slice(targets);
        args.push("-n");
        args.push(namespace);
        self.run("bind", &args).await
    }

    /// Report the details of a compliance check result.
    pub async fn view_result(&self, check: &str, namespace: &str) -> Result<String> {
        self.run("view-result", &[check, "-n", namespace]).await
    }

    /// Download remediation fixes for a profile or rule into `output_dir`.
    pub async fn fetch_fixes(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        output_dir: &Path,
    ) -> Result<String> {
        let dir = output_dir.display().to_string();
        self.run("fetch-fixes", &[kind, name, "-n", namespace, "-o", &dir])
            .await
    }

    /// Download the raw ARF results of a scan into `output_dir`.
    pub async fn fetch_raw(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        output_dir: &Path,
    ) -> Result<String> {
        let dir = output_dir.display().to_string();
        self.run("fetch-raw", &[kind, name, "-n", namespace, "-o", &dir])
            .await
    }
}
