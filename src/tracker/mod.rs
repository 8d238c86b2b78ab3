//! Per-test registry of created cluster resources.
//!
//! Every resource a test creates is registered here right after
//! creation, so teardown can delete whatever is still left regardless of
//! how the test ended. Deletion is best-effort idempotent: a resource
//! that is already gone counts as cleaned.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::check::poll;
use crate::cli::{ActionRunner, Privilege, Scope};
use crate::error::Result;

const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DELETE_POLL_WINDOW: Duration = Duration::from_secs(120);

/// Identity of a tracked resource: kind, name and (optional) namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

/// A created cluster resource owned by one test case.
#[derive(Clone, Debug)]
pub struct TrackedResource {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl TrackedResource {
    /// A cluster-scoped resource.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
        }
    }

    /// A namespaced resource.
    pub fn namespaced(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            kind: self.kind.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![self.kind.clone(), self.name.clone()];
        if let Some(ns) = &self.namespace {
            args.push("-n".to_string());
            args.push(ns.clone());
        }
        args
    }

    /// Delete the resource and wait until the API no longer reports it.
    ///
    /// Not-found on the initial delete means the resource is already
    /// clean and is not an error.
    pub async fn delete<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        match runner
            .run_action("delete", Privilege::Admin, Scope::ClusterWide, &self.args())
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(kind = %self.kind, name = %self.name, "already deleted");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let args = self.args();
        poll(
            DELETE_POLL_INTERVAL,
            DELETE_POLL_WINDOW,
            format!("deletion of {} {}", self.kind, self.name),
            || {
                let args = args.clone();
                async move {
                    match runner
                        .run_action("get", Privilege::Admin, Scope::ClusterWide, &args)
                        .await
                    {
                        Err(e) if e.is_not_found() => Some(()),
                        Ok(_) => None,
                        Err(e) => {
                            debug!(error = %e, "get failed while waiting for deletion");
                            None
                        }
                    }
                }
            },
        )
        .await
    }
}

/// Registry of resources created by a single test case.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    resources: HashMap<ResourceKey, TrackedResource>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource right after creating it.
    pub fn add(&mut self, resource: TrackedResource) {
        debug!(kind = %resource.kind, name = %resource.name, "tracking resource");
        self.resources.insert(resource.key(), resource);
    }

    pub fn get(&self, kind: &str, name: &str, namespace: Option<&str>) -> Option<&TrackedResource> {
        self.resources.get(&ResourceKey {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Delete one resource and evict it from the registry.
    ///
    /// An unregistered key is a no-op.
    pub async fn remove<R: ActionRunner>(
        &mut self,
        runner: &R,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<()> {
        let key = ResourceKey {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        };
        match self.resources.remove(&key) {
            Some(resource) => resource.delete(runner).await,
            None => Ok(()),
        }
    }

    /// Delete everything still registered, once each.
    ///
    /// Failures are logged and do not stop the remaining deletions; the
    /// registry is empty afterwards either way.
    pub async fn cleanup<R: ActionRunner>(&mut self, runner: &R) {
        for (_, resource) in self.resources.drain() {
            info!(kind = %resource.kind, name = %resource.name, "cleaning up resource");
            if let Err(e) = resource.delete(runner).await {
                warn!(
                    kind = %resource.kind,
                    name = %resource.name,
                    error = %e,
                    "cleanup failed"
                );
            }
        }
    }
}

/// Two-level registry: test-case name to its resource tracker.
///
/// Suites that share one registry across cases register each case up
/// front and tear it down in their after-each hook.
#[derive(Debug, Default)]
pub struct SuiteTracker {
    cases: HashMap<String, ResourceTracker>,
}

impl SuiteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracker for a test case, created on first use.
    pub fn tracker_for(&mut self, case: &str) -> &mut ResourceTracker {
        self.cases.entry(case.to_string()).or_default()
    }

    /// Clean up and forget everything a test case registered.
    pub async fn teardown<R: ActionRunner>(&mut self, runner: &R, case: &str) {
        if let Some(mut tracker) = self.cases.remove(case) {
            tracker.cleanup(runner).await;
        }
    }
}
