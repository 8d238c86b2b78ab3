//! Descriptors for security-profiles-operator resources.

use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::ArtifactDir;
use crate::check::{Check, CmpMode};
use crate::cli::{ActionRunner, Cli, Privilege, Scope};
use crate::error::Result;
use crate::template::{TemplateParams, apply_from_template};
use crate::tracker::{ResourceTracker, TrackedResource};

const PROFILE_WINDOW: Duration = Duration::from_secs(180);

async fn wait_status_installed<R: ActionRunner>(
    runner: &R,
    kind: &str,
    name: &str,
    namespace: &str,
) -> Result<()> {
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        "Installed",
        true,
        &[
            kind,
            name,
            "-n",
            namespace,
            "-o=jsonpath={.status.status}",
        ],
    )
    .with_window(PROFILE_WINDOW)
    .try_check(runner)
    .await
}

/// A SeccompProfile created from a template.
#[derive(Clone, Debug)]
pub struct SeccompProfile {
    pub name: String,
    pub namespace: String,
    /// Base profile to inherit from, when the template supports one
    pub base_profile: Option<String>,
    pub template: PathBuf,
}

impl SeccompProfile {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let mut template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace);
        if let Some(base) = &self.base_profile {
            template = template.param("BASEPROFILENAME", base);
        }
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "seccompprofile",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    pub async fn wait_installed<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        wait_status_installed(runner, "seccompprofile", &self.name, &self.namespace).await
    }

    /// Path under which the spod daemon installs the profile on nodes.
    pub fn localhost_profile(&self) -> String {
        format!("operator/{}/{}.json", self.namespace, self.name)
    }
}

/// A SelinuxProfile created from a template.
#[derive(Clone, Debug)]
pub struct SelinuxProfile {
    pub name: String,
    pub namespace: String,
    pub template: PathBuf,
}

impl SelinuxProfile {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace);
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "selinuxprofile",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    pub async fn wait_installed<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        wait_status_installed(runner, "selinuxprofile", &self.name, &self.namespace).await
    }

    /// The usage string pods put in their SELinux options.
    pub fn usage(&self) -> String {
        format!("{}_{}.process", self.name, self.namespace)
    }
}

/// A pod bound to a localhost seccomp profile, created from a template.
#[derive(Clone, Debug)]
pub struct ProfileBoundPod {
    pub name: String,
    pub namespace: String,
    pub localhost_profile: String,
    pub template: PathBuf,
}

impl ProfileBoundPod {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace)
            .param("LOCALHOSTPROFILE", &self.localhost_profile);
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "pod",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    pub async fn wait_running<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            "Running",
            true,
            &[
                "pod",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.phase}",
            ],
        )
        .with_window(PROFILE_WINDOW)
        .try_check(runner)
        .await
    }

    /// The pod must not be crash-looping or erroring.
    pub async fn assert_not_failing<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Contain,
            "CrashLoopBackOff Error",
            false,
            &[
                "pod",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.containerStatuses[*].state}",
            ],
        )
        .try_check(runner)
        .await
    }
}
