//! Descriptors for compliance-operator resources.
//!
//! The harness owns none of these kinds; it creates them from templates
//! and reads their status back through the checker.

use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::ArtifactDir;
use crate::check::{Check, CmpMode};
use crate::cli::action::get_resource;
use crate::cli::{ActionRunner, Cli, Privilege, Scope};
use crate::error::Result;
use crate::template::{TemplateParams, apply_from_template};
use crate::tracker::{ResourceTracker, TrackedResource};

/// A suite ends in one of these results; scans against a drifted
/// cluster legitimately report either.
pub const RESULT_COMPLIANT_OR_NOT: &str = "COMPLIANT NON-COMPLIANT";

/// Window for a full scan to run to completion.
pub const SCAN_WINDOW: Duration = Duration::from_secs(900);

/// A ScanSettingBinding created from a template.
///
/// Creating one makes the operator generate a ComplianceSuite of the
/// same name.
#[derive(Clone, Debug)]
pub struct ScanSettingBinding {
    pub name: String,
    pub namespace: String,
    pub profile: String,
    pub scan_setting: String,
    pub template: PathBuf,
}

impl ScanSettingBinding {
    pub async fn create(
        &self,
        cli: &Cli,
        artifacts: &ArtifactDir,
        tracker: &mut ResourceTracker,
    ) -> Result<()> {
        let template = TemplateParams::new(&self.template)
            .param("NAME", &self.name)
            .param("NAMESPACE", &self.namespace)
            .param("PROFILE", &self.profile)
            .param("SCANSETTING", &self.scan_setting);
        apply_from_template(cli, artifacts, &template).await?;
        tracker.add(TrackedResource::namespaced(
            "scansettingbinding",
            &self.name,
            &self.namespace,
        ));
        Ok(())
    }

    /// Wait for the generated suite to reach phase `DONE`.
    pub async fn wait_suite_done<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            "DONE",
            true,
            &[
                "compliancesuite",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.phase}",
            ],
        )
        .with_window(SCAN_WINDOW)
        .try_check(runner)
        .await
    }

    /// The suite result must land on a terminal value.
    pub async fn assert_suite_result<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        Check::expect(
            Privilege::Admin,
            Scope::ClusterWide,
            CmpMode::Compare,
            RESULT_COMPLIANT_OR_NOT,
            true,
            &[
                "compliancesuite",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.result}",
            ],
        )
        .try_check(runner)
        .await
    }

    /// One-shot read of the suite result.
    pub async fn suite_result<R: ActionRunner>(&self, runner: &R) -> Result<String> {
        get_resource(
            runner,
            Privilege::Admin,
            Scope::ClusterWide,
            &[
                "compliancesuite",
                self.name.as_str(),
                "-n",
                self.namespace.as_str(),
                "-o=jsonpath={.status.result}",
            ],
        )
        .await
    }
}

/// Wait for one compliance check result to report an expected status
/// (`PASS`, `FAIL`, `MANUAL`, ...).
pub async fn wait_check_result<R: ActionRunner>(
    runner: &R,
    namespace: &str,
    check_name: &str,
    expected: &str,
) -> Result<()> {
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        expected,
        true,
        &[
            "compliancecheckresult",
            check_name,
            "-n",
            namespace,
            "-o=jsonpath={.status}",
        ],
    )
    .try_check(runner)
    .await
}

/// Wait until every scan owned by the binding has left the given phase,
/// e.g. `LAUNCHING` after a rerun was requested.
pub async fn wait_scans_past_phase<R: ActionRunner>(
    runner: &R,
    namespace: &str,
    phase: &str,
) -> Result<()> {
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Contain,
        phase,
        false,
        &[
            "compliancescan",
            "-n",
            namespace,
            "-o=jsonpath={.items[*].status.phase}",
        ],
    )
    .try_check(runner)
    .await
}
