//! Thin wrappers around the external cluster command-line client.

pub mod action;
pub mod client;
pub mod plugin;

pub use action::{ActionRunner, Privilege, Scope};
pub use client::Cli;
pub use plugin::ComplianceCli;
