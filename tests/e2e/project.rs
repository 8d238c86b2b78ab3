//! RAII test project: an isolated namespace plus the resource tracker
//! for everything a test creates.
//!
//! IMPORTANT: tests using TestProject must use
//! `#[tokio::test(flavor = "multi_thread")]` so Drop can run the async
//! cleanup via `block_in_place`.

use std::sync::atomic::{AtomicBool, Ordering};

use compliance_e2e::{Cli, Privilege, ResourceTracker, Scope};

/// A test namespace that is automatically cleaned up when dropped.
///
/// The namespace name is `{prefix}-{suffix}` for uniqueness, so tests
/// in the same binary never collide.
pub struct TestProject {
    cli: Cli,
    name: String,
    pub tracker: ResourceTracker,
    cleanup_initiated: AtomicBool,
}

impl TestProject {
    pub async fn create(cli: &Cli, prefix: &str) -> Self {
        let name = format!("{}-{}", prefix, compliance_e2e::random_suffix());
        cli.run(
            "create",
            Privilege::Admin,
            Scope::ClusterWide,
            &["namespace", &name],
        )
        .await
        .unwrap_or_else(|e| panic!("failed to create namespace {name}: {e}"));
        cli.run(
            "label",
            Privilege::Admin,
            Scope::ClusterWide,
            &[
                "namespace",
                &name,
                "app.kubernetes.io/managed-by=compliance-e2e",
                "--overwrite",
            ],
        )
        .await
        .unwrap_or_else(|e| panic!("failed to label namespace {name}: {e}"));
        tracing::info!(namespace = %name, "created test namespace");

        Self {
            cli: cli.clone().with_namespace(&name),
            name,
            tracker: ResourceTracker::new(),
            cleanup_initiated: AtomicBool::new(false),
        }
    }

    /// Namespace-bound client for this project.
    pub fn cli(&self) -> Cli {
        self.cli.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Automatic cleanup on drop: deletes tracked resources, then the
/// namespace. Requires the multi-threaded runtime.
impl Drop for TestProject {
    fn drop(&mut self) {
        if self.cleanup_initiated.swap(true, Ordering::SeqCst) {
            return;
        }

        let cli = self.cli.clone();
        let name = self.name.clone();
        let mut tracker = std::mem::take(&mut self.tracker);
        tracing::debug!(namespace = %name, "cleaning up test project");

        tokio::task::block_in_place(|| {
            let handle = tokio::runtime::Handle::current();
            handle.block_on(async {
                tracker.cleanup(&cli).await;

                match cli
                    .run(
                        "delete",
                        Privilege::Admin,
                        Scope::ClusterWide,
                        &["namespace", &name, "--wait=false"],
                    )
                    .await
                {
                    Ok(_) => {
                        tracing::debug!(namespace = %name, "namespace deletion initiated");
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        tracing::warn!(namespace = %name, error = %e, "failed to delete namespace");
                    }
                }
            });
        });
    }
}
