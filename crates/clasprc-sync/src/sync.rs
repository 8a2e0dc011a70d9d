//! Secret sync - push the credentials file into a repository's Actions secrets
//!
//! The three operations fail differently on purpose:
//! - `check_repo_access` never fails, the outcome is in the returned value
//! - `upload_secrets` returns every failure to the caller
//! - `delete_secrets` only warns, a missing secret is fine

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clasprc_core::{CredentialsError, CredentialsFile, ExecError, Executor, GhCli};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the Actions secret holding the base64-encoded credentials file
pub const SECRET_NAME: &str = "CLASPRC_JSON";

pub const GH_MISSING: &str = "gh command missing";
pub const REPO_NOT_FOUND: &str = "Repository not found";
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from gh api";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{} not found - run `clasp login` first", .0.display())]
    MissingCredentialsFile(PathBuf),

    #[error("gh command failed: {0}")]
    CommandFailed(String),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Could not detect a GitHub repository here - pass --repo owner/name")]
    RepoUndetected,
}

/// What `gh api repos/<repo>` told us
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAccess {
    pub exists: bool,
    pub can_push: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepoAccess {
    fn found(can_push: bool) -> Self {
        Self {
            exists: true,
            can_push,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            exists: false,
            can_push: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotDeleted { reason: String },
}

/// Check that `repo` looks like `owner/name`
pub fn validate_repo(repo: &str) -> Result<String, String> {
    let valid = match repo.split_once('/') {
        Some((owner, name)) => {
            !owner.is_empty()
                && !name.is_empty()
                && !name.contains('/')
                && !repo.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(repo.to_string())
    } else {
        Err(format!("expected owner/name, got '{}'", repo))
    }
}

/// Base64 (standard, padded) encoding of the secret payload
pub fn encode_payload(content: &[u8]) -> String {
    STANDARD.encode(content)
}

/// Syncs one credentials file through the GitHub CLI
pub struct SecretSync<E: Executor> {
    gh: GhCli<E>,
    credentials: CredentialsFile,
}

impl<E: Executor> SecretSync<E> {
    pub fn new(gh: GhCli<E>, credentials: CredentialsFile) -> Self {
        Self { gh, credentials }
    }

    pub fn credentials(&self) -> &CredentialsFile {
        &self.credentials
    }

    /// Whether `repo` exists and the current gh user can push to it
    pub fn check_repo_access(&self, repo: &str) -> RepoAccess {
        let endpoint = format!("repos/{}", repo);
        let output = match self.gh.run(&["api", &endpoint]) {
            Ok(output) => output,
            Err(ExecError::ExecutableNotFound(_)) => return RepoAccess::failed(GH_MISSING),
            Err(e) => return RepoAccess::failed(e.to_string()),
        };

        // Auth failures and rate limits land here too
        if !output.success() {
            debug!(repo, stderr = %output.stderr.trim(), "repository lookup failed");
            return RepoAccess::failed(REPO_NOT_FOUND);
        }

        match serde_json::from_str::<serde_json::Value>(&output.stdout) {
            Ok(body) => {
                let can_push = body["permissions"]["push"].as_bool().unwrap_or(false);
                RepoAccess::found(can_push)
            }
            Err(e) => {
                debug!(repo, error = %e, "unparseable gh api response");
                RepoAccess::failed(UNEXPECTED_RESPONSE)
            }
        }
    }

    /// Store the credentials file as the `CLASPRC_JSON` secret of `repo`
    pub fn upload_secrets(&self, repo: &str) -> Result<(), SyncError> {
        if !self.credentials.exists() {
            return Err(SyncError::MissingCredentialsFile(self.credentials.path()));
        }

        let content = self.credentials.read_raw()?;
        let payload = encode_payload(&content);

        // Payload goes over stdin: no argv length limit, nothing in process listings
        let output = self
            .gh
            .run_with_input(&["secret", "set", SECRET_NAME, "-R", repo], &payload)?;

        if !output.success() {
            return Err(SyncError::CommandFailed(output.error_message()));
        }

        info!(repo, secret = SECRET_NAME, "secret uploaded");
        Ok(())
    }

    /// Remove the `CLASPRC_JSON` secret from `repo`
    pub fn delete_secrets(&self, repo: &str) -> DeleteOutcome {
        let reason = match self.gh.run(&["secret", "delete", SECRET_NAME, "-R", repo]) {
            Ok(output) if output.success() => {
                info!(repo, secret = SECRET_NAME, "secret deleted");
                return DeleteOutcome::Deleted;
            }
            Ok(output) => output.error_message(),
            Err(e) => e.to_string(),
        };

        warn!(
            repo,
            %reason,
            "Failed to delete {} from GitHub Secrets (may not exist)",
            SECRET_NAME
        );
        DeleteOutcome::NotDeleted { reason }
    }

    /// `owner/name` of the repository for the current directory
    pub fn detect_repo(&self) -> Result<String, SyncError> {
        let output = self
            .gh
            .run(&["repo", "view", "--json", "nameWithOwner", "-q", ".nameWithOwner"])?;

        let repo = output.stdout.trim();
        if !output.success() || repo.is_empty() {
            return Err(SyncError::RepoUndetected);
        }

        Ok(repo.to_string())
    }
}
