//! Artifact persistence for scan reports and gathered output.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;

use crate::cli::action::get_resource;
use crate::cli::{ActionRunner, Privilege, Scope};
use crate::error::Result;

/// Directory where the suite persists reports, rendered manifests and
/// fetched raw results.
#[derive(Clone, Debug)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from `ARTIFACT_DIR` (system temp dir when unset).
    pub fn from_env() -> Self {
        Self::new(crate::config::Config::from_env().artifact_dir)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a timestamped subdirectory for one suite run.
    pub fn run_scoped(&self, prefix: &str) -> Result<ArtifactDir> {
        let stamp = jiff::Zoned::now().strftime("%Y%m%d-%H%M%S");
        let dir = self.root.join(format!("{prefix}-{stamp}"));
        std::fs::create_dir_all(&dir)?;
        Ok(ArtifactDir::new(dir))
    }

    /// Create a named subdirectory, e.g. as a fetch destination.
    pub fn subdir(&self, name: &str) -> Result<ArtifactDir> {
        let dir = self.root.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(ArtifactDir::new(dir))
    }

    /// Persist one artifact and return its path.
    pub async fn save(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, contents.as_ref()).await?;
        info!(path = %path.display(), "saved artifact");
        Ok(path)
    }

    /// Run an admin query and persist its output as one artifact.
    pub async fn save_command_output<R: ActionRunner>(
        &self,
        runner: &R,
        name: &str,
        args: &[&str],
    ) -> Result<PathBuf> {
        let output = get_resource(runner, Privilege::Admin, Scope::ClusterWide, args).await?;
        self.save(name, output).await
    }
}

/// Count regular files under `dir` (recursively) whose file name matches
/// `pattern`.
///
/// Used to verify that gather-style operations actually produced output,
/// e.g. raw ARF result bundles fetched from a scan.
pub fn count_files_recursively(dir: &Path, pattern: &Regex) -> Result<usize> {
    let mut count = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && pattern.is_match(name)
            {
                count += 1;
            }
        }
    }
    Ok(count)
}
