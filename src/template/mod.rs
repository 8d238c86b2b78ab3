//! Manifest templating via the client's `process` verb.
//!
//! Templates are YAML files with `${KEY}` parameters. Processing runs
//! server-side; the rendered JSON is written under the artifact dir so
//! failed applies leave something to look at.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::artifacts::ArtifactDir;
use crate::check::poll;
use crate::cli::action::to_args;
use crate::cli::{ActionRunner, Privilege, Scope};
use crate::error::Result;

const PROCESS_POLL_INTERVAL: Duration = Duration::from_secs(3);
const PROCESS_POLL_WINDOW: Duration = Duration::from_secs(15);

/// Parameters for one template expansion.
#[derive(Clone, Debug)]
pub struct TemplateParams {
    file: PathBuf,
    params: Vec<(String, String)>,
    extra_args: Vec<String>,
}

impl TemplateParams {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            params: Vec::new(),
            extra_args: Vec::new(),
        }
    }

    /// Add one `KEY=value` substitution.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a raw argument passed through to the `process` invocation.
    pub fn arg(mut self, raw: impl Into<String>) -> Self {
        self.extra_args.push(raw.into());
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn process_args(&self) -> Vec<String> {
        let mut args = vec![
            "--ignore-unknown-parameters=true".to_string(),
            "-f".to_string(),
            self.file.display().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        for (key, value) in &self.params {
            args.push("-p".to_string());
            args.push(format!("{key}={value}"));
        }
        args
    }
}

/// Process the template and apply the rendered manifest as admin.
///
/// Returns the path of the rendered file.
pub async fn apply_from_template<R: ActionRunner>(
    runner: &R,
    artifacts: &ArtifactDir,
    template: &TemplateParams,
) -> Result<PathBuf> {
    let rendered = render(runner, artifacts, template).await?;
    apply_rendered(runner, &rendered).await?;
    Ok(rendered)
}

/// Like [`apply_from_template`], but drops every rendered line that
/// contains `keyword` before applying.
///
/// Used to exercise defaulting behavior by removing optional fields
/// from an otherwise complete template.
pub async fn apply_without_keyword<R: ActionRunner>(
    runner: &R,
    artifacts: &ArtifactDir,
    template: &TemplateParams,
    keyword: &str,
) -> Result<PathBuf> {
    let rendered = render(runner, artifacts, template).await?;
    let contents = tokio::fs::read_to_string(&rendered).await?;
    tokio::fs::write(&rendered, strip_lines_containing(&contents, keyword)).await?;
    apply_rendered(runner, &rendered).await?;
    Ok(rendered)
}

/// Drop every line containing `keyword`.
pub fn strip_lines_containing(contents: &str, keyword: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.contains(keyword))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn render<R: ActionRunner>(
    runner: &R,
    artifacts: &ArtifactDir,
    template: &TemplateParams,
) -> Result<PathBuf> {
    let args = template.process_args();
    let output = poll(
        PROCESS_POLL_INTERVAL,
        PROCESS_POLL_WINDOW,
        format!("processing template {}", template.file.display()),
        || {
            let args = args.clone();
            async move {
                match runner
                    .run_action("process", Privilege::Admin, Scope::Namespaced, &args)
                    .await
                {
                    Ok(output) => Some(output),
                    Err(e) => {
                        debug!(error = %e, "template processing failed, retrying");
                        None
                    }
                }
            }
        },
    )
    .await?;

    let path = artifacts
        .path()
        .join(format!("{}-rendered.json", crate::random_suffix()));
    tokio::fs::write(&path, output).await?;
    debug!(path = %path.display(), "rendered template");
    Ok(path)
}

async fn apply_rendered<R: ActionRunner>(runner: &R, rendered: &Path) -> Result<()> {
    let file = rendered.display().to_string();
    runner
        .run_action(
            "apply",
            Privilege::Admin,
            Scope::ClusterWide,
            &to_args(&["-f", &file]),
        )
        .await
        .map(drop)
}
