//! Action routing: privilege and namespace-scoping selection.
//!
//! Every interaction with the cluster goes through [`ActionRunner`],
//! which is the seam mocked out in unit tests. The two selectors below
//! replace the boolean call-site labels the suite historically used.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::check::poll;
use crate::error::Result;

/// Which credentials an action runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// Run with the admin kubeconfig
    Admin,
    /// Run with the unprivileged session
    User,
}

/// Whether the client injects the session's namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// No implicit `-n`; callers pass namespaces inline when needed
    ClusterWide,
    /// The session's namespace is appended as `-n <ns>`
    Namespaced,
}

/// Executes one action verb against the external cluster client.
///
/// Implemented by [`Cli`](super::Cli) for real clusters and by scripted
/// mocks in unit tests.
pub trait ActionRunner {
    fn run_action(
        &self,
        verb: &str,
        privilege: Privilege,
        scope: Scope,
        args: &[String],
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Convert borrowed argument lists into the owned form the runner takes.
pub fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

/// One-shot get; the caller decides how to handle errors.
pub async fn get_resource<R: ActionRunner>(
    runner: &R,
    privilege: Privilege,
    scope: Scope,
    args: &[&str],
) -> Result<String> {
    runner.run_action("get", privilege, scope, &to_args(args)).await
}

/// Poll a get until it succeeds with non-empty output, then return it.
///
/// Used for fields that operators populate asynchronously, like
/// `.status.installedCSV`.
pub async fn get_resource_to_be_ready<R: ActionRunner>(
    runner: &R,
    privilege: Privilege,
    scope: Scope,
    args: &[&str],
) -> Result<String> {
    let owned = to_args(args);
    poll(
        Duration::from_secs(3),
        Duration::from_secs(120),
        format!("non-empty output from get {args:?}"),
        || {
            let owned = owned.clone();
            async move {
                match runner.run_action("get", privilege, scope, &owned).await {
                    Ok(output) if !output.is_empty() => Some(output),
                    Ok(_) => None,
                    Err(e) => {
                        debug!(error = %e, "get not ready, retrying");
                        None
                    }
                }
            }
        },
    )
    .await
}

/// Poll until the resource's presence matches `present`.
///
/// Appends `--ignore-not-found` so absence shows up as empty output
/// instead of an error.
pub async fn is_resource_present<R: ActionRunner>(
    runner: &R,
    privilege: Privilege,
    scope: Scope,
    args: &[&str],
    present: bool,
    interval: Duration,
    window: Duration,
) -> bool {
    let mut owned = to_args(args);
    owned.push("--ignore-not-found".to_string());
    poll(
        interval,
        window,
        format!("presence={present} of {args:?}"),
        || {
            let owned = owned.clone();
            async move {
                match runner.run_action("get", privilege, scope, &owned).await {
                    Ok(output) => (!output.is_empty() == present).then_some(()),
                    Err(e) => {
                        debug!(error = %e, "get failed, retrying");
                        None
                    }
                }
            }
        },
    )
    .await
    .is_ok()
}
