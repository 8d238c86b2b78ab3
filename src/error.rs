//! Error types for harness operations.
//!
//! One error enum covers the whole harness. Callers classify failures by
//! inspecting the captured command output rather than through dedicated
//! variants, since the external client reports everything as text.

use std::time::Duration;

use thiserror::Error;

/// Error type for harness operations
#[derive(Error, Debug)]
pub enum Error {
    /// The external client binary could not be spawned
    #[error("failed to spawn `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The external client exited non-zero; `output` carries combined
    /// stdout and stderr for string-content classification
    #[error("`{command}` exited with code {code:?}: {output}")]
    Command {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// A polled condition was not satisfied within its window
    #[error("timed out after {window:?} waiting for {what}; last observed: {last:?}")]
    Timeout {
        what: String,
        window: Duration,
        last: Option<String>,
    },

    /// Filesystem error while persisting artifacts or rendered templates
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON from a `-o json` query
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV name did not carry a parseable semantic version
    #[error("invalid version in `{csv}`: {source}")]
    Version {
        csv: String,
        #[source]
        source: semver::Error,
    },
}

impl Error {
    /// Check if this error indicates a not-found condition.
    ///
    /// The external client reports missing resources either as an API
    /// `NotFound` error or as "No resources found" on a list.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Command { output, .. } => {
                output.contains("NotFound") || output.contains("No resources found")
            }
            _ => false,
        }
    }

    /// Check if this error should be retried during polling.
    ///
    /// Command and I/O failures are treated as transient. A spawn
    /// failure means the client binary itself is missing, which no
    /// amount of polling fixes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Command { .. } | Error::Io(_))
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;
