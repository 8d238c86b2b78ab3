//! Precondition probes that map to test skips instead of failures.
//!
//! Unmet environmental preconditions (missing catalog source, no default
//! storage class, single-node topology, ...) are not test failures.
//! Probes return `Err(Skip)` with the reason; test bodies log it and
//! return early. A probe that cannot even query the cluster also skips,
//! on the grounds that the assertion was never reached.

use std::fmt;

use serde_json::Value;

use crate::cli::action::{get_resource, to_args};
use crate::cli::{ActionRunner, Privilege, Scope};

/// Reason a test case was skipped.
#[derive(Clone, Debug)]
pub struct Skip(String);

impl Skip {
    pub fn because(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a precondition probe.
pub type Precondition = std::result::Result<(), Skip>;

/// The named catalog source must exist and report a healthy connection.
pub async fn require_catalog_source<R: ActionRunner>(runner: &R, name: &str) -> Precondition {
    let result = get_resource(
        runner,
        Privilege::Admin,
        Scope::ClusterWide,
        &[
            "catalogsource",
            name,
            "-n",
            "openshift-marketplace",
            "-o=jsonpath={.status.connectionState.lastObservedState}",
            "--ignore-not-found",
        ],
    )
    .await;
    match result {
        Ok(state) if state == "READY" => Ok(()),
        Ok(state) => Err(Skip::because(format!(
            "catalog source {name} not available (state {state:?})"
        ))),
        Err(e) => Err(Skip::because(format!(
            "could not query catalog source {name}: {e}"
        ))),
    }
}

/// Exactly one storage class must be annotated as the default.
pub async fn require_default_storage_class<R: ActionRunner>(runner: &R) -> Precondition {
    let output = match runner
        .run_action(
            "get",
            Privilege::Admin,
            Scope::ClusterWide,
            &to_args(&["storageclass", "-o", "json"]),
        )
        .await
    {
        Ok(output) => output,
        Err(e) => return Err(Skip::because(format!("could not list storage classes: {e}"))),
    };
    let parsed: Value = match serde_json::from_str(&output) {
        Ok(parsed) => parsed,
        Err(e) => return Err(Skip::because(format!("unparseable storage class list: {e}"))),
    };
    let defaults: Vec<String> = parsed
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.pointer(
                        "/metadata/annotations/storageclass.kubernetes.io~1is-default-class",
                    )
                    .and_then(Value::as_str)
                        == Some("true")
                })
                .filter_map(|item| item.pointer("/metadata/name"))
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    match defaults.len() {
        0 => Err(Skip::because("no default storage class is available")),
        1 => Ok(()),
        _ => Err(Skip::because(format!(
            "multiple default storage classes detected: {defaults:?}"
        ))),
    }
}

/// The cluster must have nodes beyond the control plane (skip for
/// single-node and compact topologies).
pub async fn require_multi_node<R: ActionRunner>(runner: &R) -> Precondition {
    let all = node_names(runner, None).await?;
    let control_plane = node_names(runner, Some("node-role.kubernetes.io/master")).await?;
    if all.len() <= control_plane.len() {
        Err(Skip::because(
            "single-node or compact cluster: every node is control plane",
        ))
    } else {
        Ok(())
    }
}

/// At least one RHCOS worker must be present.
pub async fn require_rhcos_workers<R: ActionRunner>(runner: &R) -> Precondition {
    let workers = node_names(
        runner,
        Some("node.openshift.io/os_id=rhcos,node-role.kubernetes.io/worker"),
    )
    .await?;
    if workers.is_empty() {
        Err(Skip::because("no rhcos workers are available"))
    } else {
        Ok(())
    }
}

/// The cluster must have been installed with FIPS mode enabled.
///
/// The install config persisted in `cluster-config-v1` records the
/// choice.
pub async fn require_fips<R: ActionRunner>(runner: &R) -> Precondition {
    let result = get_resource(
        runner,
        Privilege::Admin,
        Scope::ClusterWide,
        &[
            "configmap",
            "cluster-config-v1",
            "-n",
            "kube-system",
            "-o=jsonpath={.data.install-config}",
        ],
    )
    .await;
    match result {
        Ok(install_config) if install_config.contains("fips: true") => Ok(()),
        Ok(_) => Err(Skip::because("cluster is not FIPS enabled")),
        Err(e) => Err(Skip::because(format!("could not read install config: {e}"))),
    }
}

/// Map a known upstream bug signature in command output to a skip
/// instead of a failure.
pub fn skip_for_known_bug(output: &str, signature: &str, reference: &str) -> Precondition {
    if output.contains(signature) {
        Err(Skip::because(format!("known issue {reference} detected")))
    } else {
        Ok(())
    }
}

async fn node_names<R: ActionRunner>(
    runner: &R,
    label: Option<&str>,
) -> std::result::Result<Vec<String>, Skip> {
    let mut args = vec!["node"];
    if let Some(label) = label {
        args.push("-l");
        args.push(label);
    }
    args.push("-o=jsonpath={.items[*].metadata.name}");
    args.push("--ignore-not-found");
    match get_resource(runner, Privilege::Admin, Scope::ClusterWide, &args).await {
        Ok(output) => Ok(output.split_whitespace().map(str::to_string).collect()),
        Err(e) => Err(Skip::because(format!("could not list nodes: {e}"))),
    }
}
