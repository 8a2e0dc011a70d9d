//! Configuration for clasprc-sync

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::process::GH_PROGRAM;

/// Tool configuration, read from `~/.config/clasprc-sync/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub CLI binary name or path
    #[serde(default = "default_gh_program")]
    pub gh_program: String,

    /// Repository (`owner/name`) used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,
}

fn default_gh_program() -> String {
    GH_PROGRAM.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gh_program: default_gh_program(),
            default_repo: None,
        }
    }
}

impl Config {
    /// Load config from file, defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }
}

/// Values for writing a credentials file, normally taken from `CLASP_*`
/// variables set by a CI job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
    pub id_token: Option<String>,
    /// Raw `CLASP_EXPIRY_DATE`, parsed on export
    pub expiry_date: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub is_local_creds: bool,
}

impl ExportConfig {
    /// Names of every variable read by [`ExportConfig::from_lookup`]
    pub const VARS: [&'static str; 10] = [
        "CLASP_ACCESS_TOKEN",
        "CLASP_REFRESH_TOKEN",
        "CLASP_SCOPE",
        "CLASP_TOKEN_TYPE",
        "CLASP_ID_TOKEN",
        "CLASP_EXPIRY_DATE",
        "CLASP_CLIENT_ID",
        "CLASP_CLIENT_SECRET",
        "CLASP_REDIRECT_URI",
        "CLASP_IS_LOCAL_CREDS",
    ];

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            access_token: lookup("CLASP_ACCESS_TOKEN"),
            refresh_token: lookup("CLASP_REFRESH_TOKEN"),
            scope: lookup("CLASP_SCOPE"),
            token_type: lookup("CLASP_TOKEN_TYPE"),
            id_token: lookup("CLASP_ID_TOKEN"),
            expiry_date: lookup("CLASP_EXPIRY_DATE"),
            client_id: lookup("CLASP_CLIENT_ID"),
            client_secret: lookup("CLASP_CLIENT_SECRET"),
            redirect_uri: lookup("CLASP_REDIRECT_URI"),
            is_local_creds: lookup("CLASP_IS_LOCAL_CREDS").as_deref() == Some("true"),
        }
    }

    /// Variables that were not set
    pub fn missing(&self) -> Vec<&'static str> {
        let present = [
            self.access_token.is_some(),
            self.refresh_token.is_some(),
            self.scope.is_some(),
            self.token_type.is_some(),
            self.id_token.is_some(),
            self.expiry_date.is_some(),
            self.client_id.is_some(),
            self.client_secret.is_some(),
            self.redirect_uri.is_some(),
        ];
        Self::VARS
            .iter()
            .zip(present)
            .filter(|(_, set)| !set)
            .map(|(name, _)| *name)
            .collect()
    }
}
