//! Compliance-operator scan lifecycle tests.

use compliance_e2e::compliance::ScanSettingBinding;
use compliance_e2e::skip;
use compliance_e2e::{Check, Privilege, Scope};

use crate::fixtures;
use crate::project::TestProject;
use crate::session::Session;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a live cluster"]
async fn scan_reaches_done_and_reports_result() {
    let session = Session::get().await;
    let cli = session.cli();

    if let Err(skip) = skip::require_catalog_source(&cli, fixtures::CATALOG_SOURCE).await {
        eprintln!("SKIP: {skip}");
        return;
    }
    if let Err(skip) = skip::require_default_storage_class(&cli).await {
        eprintln!("SKIP: {skip}");
        return;
    }

    let mut project = TestProject::create(&cli, "compliance").await;
    fixtures::install_operator(session, &mut project, fixtures::COMPLIANCE_PACKAGE, "stable").await;
    let cli = project.cli();
    fixtures::wait_deployment_available(&cli, project.name(), "compliance-operator").await;

    let binding = ScanSettingBinding {
        name: format!("cis-{}", compliance_e2e::random_suffix()),
        namespace: project.name().to_string(),
        profile: "ocp4-cis".to_string(),
        scan_setting: "default".to_string(),
        template: Session::testdata("scan-setting-binding.yaml"),
    };
    binding
        .create(&cli, session.artifacts(), &mut project.tracker)
        .await
        .unwrap();

    binding.wait_suite_done(&cli).await.unwrap();
    binding.assert_suite_result(&cli).await.unwrap();

    // Scans produce per-rule check results; the suite is useless without
    // them.
    Check::present(
        Privilege::Admin,
        Scope::ClusterWide,
        true,
        &["compliancecheckresult", "-n", project.name()],
    )
    .check(&cli)
    .await;

    let result = binding.suite_result(&cli).await.unwrap();
    println!("suite {} finished {result}", binding.name);
    session
        .artifacts()
        .save_command_output(
            &cli,
            &format!("{}-suite.json", binding.name),
            &[
                "compliancesuite",
                binding.name.as_str(),
                "-n",
                project.name(),
                "-o",
                "json",
            ],
        )
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a live cluster"]
async fn operator_upgrade_installs_newer_csv() {
    let session = Session::get().await;
    let cli = session.cli();

    if let Err(skip) = skip::require_catalog_source(&cli, fixtures::CATALOG_SOURCE).await {
        eprintln!("SKIP: {skip}");
        return;
    }

    let mut project = TestProject::create(&cli, "compliance-upgrade").await;
    let mut subscription = fixtures::install_operator(
        session,
        &mut project,
        fixtures::COMPLIANCE_PACKAGE,
        "stable",
    )
    .await;
    let cli = project.cli();

    let installed = subscription.installed_csv.clone().unwrap();
    if let Err(skip) = compliance_e2e::operators::require_upgrade_candidate(
        &cli,
        fixtures::COMPLIANCE_PACKAGE,
        &subscription.channel,
        &installed,
    )
    .await
    {
        eprintln!("SKIP: {skip}");
        return;
    }

    // OLM picks the upgrade up on its own with automatic approval; wait
    // for the subscription to settle on the new CSV.
    let upgraded = subscription
        .find_installed_csv(&cli, &mut project.tracker)
        .await
        .unwrap();
    assert_ne!(upgraded, installed, "subscription never moved off {installed}");
}
