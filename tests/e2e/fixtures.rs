//! Shared fixtures: operator installs and rollout waits used across the
//! suites.

use std::time::Duration;

use compliance_e2e::check::{Check, CmpMode};
use compliance_e2e::operators::{self, OperatorGroup, Subscription};
use compliance_e2e::{Cli, Privilege, Scope};

use crate::project::TestProject;
use crate::session::Session;

/// Catalog source the operators are installed from.
pub const CATALOG_SOURCE: &str = "redhat-operators";
pub const CATALOG_NAMESPACE: &str = "openshift-marketplace";

pub const COMPLIANCE_PACKAGE: &str = "compliance-operator";
pub const FILE_INTEGRITY_PACKAGE: &str = "file-integrity-operator";
pub const SECURITY_PROFILES_PACKAGE: &str = "security-profiles-operator";

/// Install an operator into the project's namespace and wait for its
/// CSV to succeed. Panics on failure; callers should have skipped on
/// missing catalog sources beforehand.
pub async fn install_operator(
    session: &Session,
    project: &mut TestProject,
    package: &str,
    channel: &str,
) -> Subscription {
    let cli = project.cli();
    let namespace = project.name().to_string();

    let group = OperatorGroup {
        name: format!("{package}-og"),
        namespace: namespace.clone(),
        multi_ns_label: None,
        template: Session::testdata("operator-group.yaml"),
    };
    let mut subscription = Subscription {
        name: format!("{package}-sub"),
        namespace,
        channel: channel.to_string(),
        ip_approval: "Automatic".to_string(),
        operator_package: package.to_string(),
        catalog_source: CATALOG_SOURCE.to_string(),
        catalog_source_namespace: CATALOG_NAMESPACE.to_string(),
        starting_csv: None,
        installed_csv: None,
        template: Session::testdata("subscription.yaml"),
    };

    operators::install_operator(
        &cli,
        session.artifacts(),
        &mut project.tracker,
        &group,
        &mut subscription,
    )
    .await
    .unwrap_or_else(|e| panic!("failed to install {package}: {e}"));

    subscription
}

/// Wait for a deployment to report the Available condition.
pub async fn wait_deployment_available(cli: &Cli, namespace: &str, name: &str) {
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        "True",
        true,
        &[
            "deployment",
            name,
            "-n",
            namespace,
            r#"-o=jsonpath={.status.conditions[?(@.type=="Available")].status}"#,
        ],
    )
    .with_window(Duration::from_secs(300))
    .check(cli)
    .await;
}

/// Wait for a daemon set to have no unavailable pods.
pub async fn wait_daemonset_ready(cli: &Cli, namespace: &str, name: &str) {
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        "",
        true,
        &[
            "daemonset",
            name,
            "-n",
            namespace,
            "-o=jsonpath={.status.numberUnavailable}",
        ],
    )
    .with_window(Duration::from_secs(300))
    .check(cli)
    .await;
}
