//! Security-profiles-operator tests: seccomp and SELinux profile
//! installation and pod binding.

use compliance_e2e::cli::action::is_resource_present;
use compliance_e2e::profiles::{ProfileBoundPod, SeccompProfile, SelinuxProfile};
use compliance_e2e::{skip, Check, CmpMode, Privilege, Scope};
use std::time::Duration;

use crate::fixtures;
use crate::project::TestProject;
use crate::session::Session;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a live cluster"]
async fn seccomp_profile_binds_to_a_pod() {
    let session = Session::get().await;
    let cli = session.cli();

    if let Err(skip) = skip::require_catalog_source(&cli, fixtures::CATALOG_SOURCE).await {
        eprintln!("SKIP: {skip}");
        return;
    }
    if let Err(skip) = skip::require_rhcos_workers(&cli).await {
        eprintln!("SKIP: {skip}");
        return;
    }

    let mut project = TestProject::create(&cli, "profiles").await;
    fixtures::install_operator(
        session,
        &mut project,
        fixtures::SECURITY_PROFILES_PACKAGE,
        "release-alpha-rhel-8",
    )
    .await;
    let cli = project.cli();

    // The spod daemon set must be rolled out before profiles install.
    fixtures::wait_daemonset_ready(&cli, project.name(), "spod").await;

    let profile = SeccompProfile {
        name: format!("sleep-{}", compliance_e2e::random_suffix()),
        namespace: project.name().to_string(),
        base_profile: None,
        template: Session::testdata("seccomp-profile.yaml"),
    };
    profile
        .create(&cli, session.artifacts(), &mut project.tracker)
        .await
        .unwrap();
    profile.wait_installed(&cli).await.unwrap();

    let pod = ProfileBoundPod {
        name: format!("bound-{}", compliance_e2e::random_suffix()),
        namespace: project.name().to_string(),
        localhost_profile: profile.localhost_profile(),
        template: Session::testdata("profile-pod.yaml"),
    };
    pod.create(&cli, session.artifacts(), &mut project.tracker)
        .await
        .unwrap();
    pod.wait_running(&cli).await.unwrap();
    pod.assert_not_failing(&cli).await.unwrap();

    // The pod must actually run under the localhost profile.
    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        &profile.localhost_profile(),
        true,
        &[
            "pod",
            pod.name.as_str(),
            "-n",
            project.name(),
            "-o=jsonpath={.spec.securityContext.seccompProfile.localhostProfile}",
        ],
    )
    .check(&cli)
    .await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a live cluster"]
async fn selinux_profile_reports_its_usage() {
    let session = Session::get().await;
    let cli = session.cli();

    if let Err(skip) = skip::require_catalog_source(&cli, fixtures::CATALOG_SOURCE).await {
        eprintln!("SKIP: {skip}");
        return;
    }
    if let Err(skip) = skip::require_rhcos_workers(&cli).await {
        eprintln!("SKIP: {skip}");
        return;
    }

    let mut project = TestProject::create(&cli, "selinux").await;
    fixtures::install_operator(
        session,
        &mut project,
        fixtures::SECURITY_PROFILES_PACKAGE,
        "release-alpha-rhel-8",
    )
    .await;
    let cli = project.cli();

    fixtures::wait_daemonset_ready(&cli, project.name(), "spod").await;

    // SELinux support is opt-in; without the CRD there is nothing to
    // test.
    let selinux_enabled = is_resource_present(
        &cli,
        Privilege::Admin,
        Scope::ClusterWide,
        &["crd", "selinuxprofiles.security-profiles-operator.x-k8s.io"],
        true,
        Duration::from_secs(3),
        Duration::from_secs(30),
    )
    .await;
    if !selinux_enabled {
        eprintln!("SKIP: selinuxprofiles API is not enabled on this cluster");
        return;
    }

    let profile = SelinuxProfile {
        name: format!("errorlogger-{}", compliance_e2e::random_suffix()),
        namespace: project.name().to_string(),
        template: Session::testdata("selinux-profile.yaml"),
    };
    profile
        .create(&cli, session.artifacts(), &mut project.tracker)
        .await
        .unwrap();
    profile.wait_installed(&cli).await.unwrap();

    Check::expect(
        Privilege::Admin,
        Scope::ClusterWide,
        CmpMode::Compare,
        &profile.usage(),
        true,
        &[
            "selinuxprofile",
            profile.name.as_str(),
            "-n",
            project.name(),
            "-o=jsonpath={.status.usage}",
        ],
    )
    .check(&cli)
    .await;
}
