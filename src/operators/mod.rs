//! Operator installation and upgrade helpers.
//!
//! Installing an operator means creating an OperatorGroup and a
//! Subscription from templates, then waiting for OLM to report the CSV
//! installed. Everything created lands in the resource tracker first.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::artifacts::ArtifactDir;
use crate::check::{Check, CmpMode};
use crate::cli::action::get_resource_to_be_ready;
use crate::cli::{Cli, Privilege, Scope};
use crate::error::{Error, Result};
use crate::skip::{Precondition, Skip};
use crate::template::{TemplateParams, apply_from_template};
use crate::tracker::{ResourceTracker, TrackedResource};

const INSTALL_WINDOW: Duration = Duration::from_secs(300);

/// Status of a package manifest, as reported by the marketplace.
#[derive(Clone, Debug, Deserialize)]
pub struct PackageManifest {
    pub status: PackageManifestStatus,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifestStatus {
    #[serde(default)]
    pub catalog_source: String,
    #[serde(default)]
    pub catalog_source_namespace: String,
    #[serde(default)]
    pub channels: Vec<PackageChannel>,
    #[serde(default)]
    pub default_channel: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PackageChannel {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "currentCSV", default)]
    pub current_csv: String,
}

impl PackageManifest {
    /// The CSV currently served by a channel.
    pub fn current_csv(&self, channel: &str) -> Option<&str> {
        self.status
            .channels
            .iter()
            .find(|c| c.name == channel)
            .map(|c| c.current_csv.as_str())
    }
}

/// Fetch the package manifest for an operator package.
pub async fn package_manifest<R: crate::cli::ActionRunner>(
    runner: &R,
    package: &str,
) -> Result<PackageManifest> {
    let output = runner
        .run_action(
            "get",
            Privilege::Admin,
            Scope::ClusterWide,
            &crate::cli::action::to_args(&[
                "packagemanifest",
                package,
                "-n",
                "openshift-marketplace",
                "-o",
                "json",
            ]),
        )
        .await?;
    Ok(serde_json::from_str(&output)?)
}

/// Extract the semantic version from a CSV name like
/// `compliance-operator.v1.3.0`.
pub fn csv_version(csv: &str) -> Result<semver::Version> {
    let raw = csv.rsplit_once(".v").map_or(csv, |(_, version)| version);
    semver::Version::parse(raw).map_err(|source| Error::Version {
        csv: csv.to_string(),
        source,
    })
}

/// Skip unless the subscribed channel carries a newer CSV than the one
/// installed.
pub async fn require_upgrade_candidate<R: crate::cli::ActionRunner>(
    runner: &R,
    package: &str,
    channel: &str,
    installed_csv: &str,
) -> Precondition {
    let manifest = match package_manifest(runner, package).await {
        Ok(manifest) => manifest,
        Err(e) => {
            return Err(Skip::because(format!(
                "could not read package manifest for {package}: {e}"
            )));
        }
    };
    let Some(candidate) = manifest.current_csv(channel) else {
        return Err(Skip::because(format!(
            "package {package} has no channel {channel}"
        )));
    };
    match (csv_version(candidate), csv_version(installed_csv)) {
        (Ok(candidate_version), Ok(installed_version)) if candidate_version > installed_version => {
            Ok(())
        }
        (Ok(_), Ok(_)) => Err(Skip::because("no new version detected")),
        (Err(e), _) | (_, Err(e)) => Err(Skip::because(format!("unparseable CSV version: {e}"))),
    }
}

/// An OperatorGroup created from a template.
#[derive(Clone, Debug)]
pub struct OperatorGroup {
    pub name: String,
    pub namespace: String,
    /// Label selector for multi-namespace groups, when the template
    /// supports one.
    pub multi_ns_label: Option<String>,
    pub template: PathBuf,
}

impl OperatorGroup {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let mut template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace);
        if let Some(label) = &self.multi_ns_label {
            template = template.param("MULTINSLABEL", label);
        }
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "og",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }
}

/// A Subscription created from a template.
#[derive(Clone, Debug)]
pub struct Subscription {
    pub name: String,
    pub namespace: String,
    pub channel: String,
    /// `Automatic` or `Manual`
    pub ip_approval: String,
    pub operator_package: String,
    pub catalog_source: String,
    pub catalog_source_namespace: String,
    pub starting_csv: Option<String>,
    /// Filled in once OLM reports the install
    pub installed_csv: Option<String>,
    pub template: PathBuf,
}

impl Subscription {
    /// Create the subscription and wait for OLM to act on it.
    ///
    /// With automatic approval this resolves the installed CSV; with
    /// manual approval it only waits for `UpgradePending`.
    pub async fn create(
        &mut self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        self.create_without_check(cli, artifacts, tracker).await?;
        if self.ip_approval == "Automatic" {
            self.find_installed_csv(cli, tracker).await?;
        } else {
            Check::expect(
                Privilege::Admin,
                Scope::ClusterWide,
                CmpMode::Compare,
                "UpgradePending",
                true,
                &[
                    "sub",
                    self.name.as_str(),
                    "-n",
                    self.namespace.as_str(),
                    "-o=jsonpath={.status.state}",
                ],
            )
            .try_check(cli)
            .await?;
        }
        Ok(())
    }

    /// Apply the subscription template and register it, without waiting.
    pub async fn create_without_check(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let template = TemplateParams::new(&self.template)
            .param("SUBNAME", &self.name)
            .param("SUBNAMESPACE", &self.namespace)
            .param("CHANNEL", &self.channel)
            .param("APPROVAL", &self.ip_approval)
            .param("OPERATORNAME", &self.operator_package)
            .param("SOURCENAME", &self.catalog_source)
            .param("SOURCENAMESPACE", &self.catalog_source_namespace)
            .param("STARTINGCSV", self.starting_csv.as_deref().unwrap_or(""));
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "sub",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    /// Wait for `AtLatestKnown`, read the installed CSV and track it.
    pub async fn find_installed_csv(
        &mut self,
        cli: &Cli,
        tracker: &mut ResourceTracker,
    ) -> Result<String> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            "AtLatestKnown",
            true,
            &[
                "sub",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.state}",
            ],
        )
        .with_window(INSTALL_WINDOW)
        .try_check(cli)
        .await?;

        let csv = get_resource_to_be_ready(
            cli,
            Privilege::Admin,
            Scope::ClusterWide,
            &[
                "sub",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.installedCSV}",
            ],
        )
        .await?;

        if self.installed_csv.as_deref() != Some(csv.as_str()) {
            tracker.add(TrackedResource::namespaced(
                "csv",
                &csv,
                &self.namespace,
            ));
            self.installed_csv = Some(csv.clone());
        }
        info!(csv = %csv, "installed CSV");
        Ok(csv)
    }
}

/// Create operator group and subscription, then wait for the CSV to
/// succeed.
pub async fn install_operator(
    cli: &Cli,
    artifacts: &ArtifactDir,
    tracker: &mut ResourceTracker,
    group: &OperatorGroup,
    subscription: &mut Subscription,
) -> Result<()> {
    group.create(cli, artifacts, tracker).await?;
    subscription.create(cli, artifacts, tracker).await?;
    if let Some(csv) = subscription.installed_csv.clone() {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            "Succeeded",
            true,
            &[
                "csv",
                csv.as_str(),
                "-n",
                subscription.namespace.as_str(),
                "-o=jsonpath={.status.phase}",
            ],
        )
        .with_window(INSTALL_WINDOW)
        .try_check(cli)
        .await?;
    }
    Ok(())
}
