//! compliance-e2e harness library
//!
//! Reusable infrastructure for end-to-end testing of the compliance,
//! file-integrity and security-profiles operators against a live
//! cluster. All cluster access goes through the external command-line
//! client; the harness provides the condition checker, the per-test
//! resource tracker, the action wrapper and the template/skip/artifact
//! helpers the suites in `tests/e2e/` are built on.

pub mod artifacts;
pub mod check;
pub mod cli;
pub mod compliance;
pub mod config;
pub mod error;
pub mod fileintegrity;
pub mod operators;
pub mod profiles;
pub mod skip;
pub mod template;
pub mod tracker;


pub use check::{Check, CmpMode};
pub use cli::{ActionRunner, Cli, ComplianceCli, Privilege, Scope};
pub use config::Config;
pub use error::{Error, Result};
pub use tracker::{ResourceTracker, SuiteTracker, TrackedResource};

/// Short unique suffix for per-test resource names.
pub fn random_suffix() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
