//! Descriptors for file-integrity-operator resources.

use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::ArtifactDir;
use crate::check::{Check, CmpMode};
use crate::cli::{ActionRunner, Cli, Privilege, Scope};
use crate::error::Result;
use crate::template::{TemplateParams, apply_from_template};
use crate::tracker::{ResourceTracker, TrackedResource};

/// Window for the AIDE daemon set to roll out and report per-node
/// status.
pub const NODE_STATUS_WINDOW: Duration = Duration::from_secs(300);

/// A FileIntegrity created from a template.
#[derive(Clone, Debug)]
pub struct FileIntegrity {
    pub name: String,
    pub namespace: String,
    /// Name of the AIDE config map, when overriding the default config
    pub config_name: String,
    /// Key within the config map holding the AIDE config
    pub config_key: String,
    pub grace_period: u32,
    pub debug: bool,
    pub node_selector: Option<(String, String)>,
    pub template: PathBuf,
}

impl FileIntegrity {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let mut template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace)
            .param("CONFNAME", &self.config_name)
            .param("CONFKEY", &self.config_key)
            .param("GRACEPERIOD", self.grace_period.to_string())
            .param("DEBUG", self.debug.to_string());
        if let Some((key, value)) = &self.node_selector {
            template = template
                .param("NODESELECTORKEY", key)
                .param("NODESELECTORVALUE", value);
        }
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "fileintegrity",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    /// Wait for the FileIntegrity to reach a phase (`Active`,
    /// `Initializing`, ...).
    pub async fn wait_phase<R: ActionRunner>(&self, runner: &R, phase: &str) -> Result<()> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            phase,
            true,
            &[
                "fileintegrity",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.phase}",
            ],
        )
        .with_window(NODE_STATUS_WINDOW)
        .try_check(runner)
        .await
    }

    /// Every per-node status must report a successful last scan and
    /// none may have failed or errored.
    pub async fn assert_node_statuses_succeeded<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        let args = [
            "fileintegritynodestatuses",
            "-n",
            self.namespace.as_str(),
            "-o=jsonpath={.items[*].lastResult.condition}",
        ];
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Contain,
            "Succeeded",
            true,
            &args,
        )
        .with_window(NODE_STATUS_WINDOW)
        .try_check(runner)
        .await?;
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Contain,
            "Failed Errored",
            false,
            &args,
        )
        .try_check(runner)
        .await
    }

    /// Ask the operator to reinitialize the AIDE database.
    pub async fn trigger_reinit(&self, cli: &Cli) -> Result<()> {
        cli.run(
            "annotate",
            Privilege::Admin,
            Scope::ClusterWide,
            &[
                "fileintegrity",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "file-integrity.openshift.io/re-init=",
            ],
        )
        .await
        .map(drop)
    }
}
