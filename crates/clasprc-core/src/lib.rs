//! clasprc-core - Shared functionality for clasprc-sync
//!
//! Keeps the clasp credentials file and a repository's CI secrets in step.
//! Everything here is synchronous: one file read or one `gh` call at a time.

pub mod config;
pub mod credentials;
pub mod paths;
pub mod process;

pub use config::{Config, ExportConfig};
pub use credentials::{Credentials, CredentialsError, CredentialsFile};
pub use paths::{clasprc_path, Paths, Platform};
pub use process::{ExecError, Executor, GhCli, ProcessOutput, SystemExecutor};
