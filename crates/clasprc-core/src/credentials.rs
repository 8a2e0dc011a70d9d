//! The clasp credentials file (`~/.clasprc.json`)
//!
//! The record is created by clasp's login flow or by `export`, and is only
//! ever replaced wholesale. Uploads use the raw bytes so the secret matches
//! the file exactly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths::clasprc_path;

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid credentials JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// OAuth token set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Milliseconds since the Unix epoch, null when unknown
    #[serde(default)]
    pub expiry_date: Option<i64>,
}

/// OAuth client the token was issued to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2ClientSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// Contents of `.clasprc.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub token: Token,
    #[serde(default)]
    pub oauth2_client_settings: OAuth2ClientSettings,
    #[serde(default)]
    pub is_local_creds: bool,
}

/// Where the credentials file lives
#[derive(Debug, Clone)]
enum Location {
    /// `<home>/.clasprc.json`, resolved on every access
    Home,
    Fixed(PathBuf),
}

/// Accessor for the credentials file
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    location: Location,
}

impl Default for CredentialsFile {
    fn default() -> Self {
        Self::home()
    }
}

impl CredentialsFile {
    /// The file in the user's home directory
    pub fn home() -> Self {
        Self {
            location: Location::Home,
        }
    }

    /// A file at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Fixed(path.into()),
        }
    }

    pub fn path(&self) -> PathBuf {
        match &self.location {
            Location::Home => clasprc_path(),
            Location::Fixed(path) => path.clone(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Raw file contents
    pub fn read_raw(&self) -> Result<Vec<u8>, CredentialsError> {
        let path = self.path();
        fs::read(&path).map_err(|source| CredentialsError::Io { path, source })
    }

    pub fn read(&self) -> Result<Credentials, CredentialsError> {
        let path = self.path();
        let bytes = self.read_raw()?;
        serde_json::from_slice(&bytes).map_err(|source| CredentialsError::Parse { path, source })
    }

    /// Overwrite the file with `credentials` as pretty JSON
    pub fn write(&self, credentials: &Credentials) -> Result<PathBuf, CredentialsError> {
        let path = self.path();
        write_json(&path, credentials).map_err(|source| CredentialsError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn write_json(path: &Path, credentials: &Credentials) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(credentials)?;
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Credentials {
        Credentials {
            token: Token {
                access_token: Some("ya29.token".to_string()),
                refresh_token: Some("1//refresh".to_string()),
                scope: Some("https://www.googleapis.com/auth/script.projects".to_string()),
                token_type: Some("Bearer".to_string()),
                id_token: None,
                expiry_date: Some(1_700_000_000_000),
            },
            oauth2_client_settings: OAuth2ClientSettings {
                client_id: Some("client.apps.googleusercontent.com".to_string()),
                client_secret: Some("shh".to_string()),
                redirect_uri: Some("http://localhost".to_string()),
            },
            is_local_creds: false,
        }
    }

    #[test]
    fn test_parse_clasp_layout() {
        let json = r#"{
            "token": {"access_token": "token", "expiry_date": 123456},
            "oauth2ClientSettings": {"clientId": "id", "redirectUri": "http://localhost"},
            "isLocalCreds": true
        }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.token.access_token.as_deref(), Some("token"));
        assert_eq!(creds.token.expiry_date, Some(123456));
        assert_eq!(creds.oauth2_client_settings.client_id.as_deref(), Some("id"));
        assert!(creds.oauth2_client_settings.client_secret.is_none());
        assert!(creds.is_local_creds);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["token"]["token_type"], "Bearer");
        assert!(value["token"].get("id_token").is_none());
        assert_eq!(value["oauth2ClientSettings"]["clientSecret"], "shh");
        assert_eq!(value["isLocalCreds"], false);

        let empty = serde_json::to_value(Credentials::default()).unwrap();
        assert!(empty["token"]["expiry_date"].is_null());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let file = CredentialsFile::at(dir.path().join("nested").join(".clasprc.json"));
        assert!(!file.exists());

        let written = file.write(&sample()).unwrap();
        assert_eq!(written, file.path());
        assert!(file.exists());
        assert_eq!(file.read().unwrap(), sample());

        let raw = String::from_utf8(file.read_raw().unwrap()).unwrap();
        assert!(raw.contains("\n  \"token\": {"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = CredentialsFile::at(dir.path().join(".clasprc.json"));
        assert!(matches!(file.read_raw(), Err(CredentialsError::Io { .. })));
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".clasprc.json");
        fs::write(&path, "not json").unwrap();
        let file = CredentialsFile::at(&path);
        assert!(matches!(file.read(), Err(CredentialsError::Parse { .. })));
        // Raw access does not care about the contents
        assert_eq!(file.read_raw().unwrap(), b"not json");
    }

    #[test]
    fn test_home_location_ends_with_file_name() {
        assert!(CredentialsFile::home().path().ends_with(".clasprc.json"));
    }
}
