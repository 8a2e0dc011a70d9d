//! Export - rebuild `.clasprc.json` from `CLASP_*` variables
//!
//! The CI side of the round trip: a workflow exposes its secrets as
//! environment variables and this writes the file clasp expects.

use clasprc_core::credentials::{OAuth2ClientSettings, Token};
use clasprc_core::{Credentials, CredentialsError, CredentialsFile, ExportConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Build the credentials record described by `config`
pub fn build_credentials(config: &ExportConfig) -> Credentials {
    Credentials {
        token: Token {
            access_token: config.access_token.clone(),
            refresh_token: config.refresh_token.clone(),
            scope: config.scope.clone(),
            token_type: config.token_type.clone(),
            id_token: config.id_token.clone(),
            expiry_date: config.expiry_date.as_deref().and_then(parse_expiry),
        },
        oauth2_client_settings: OAuth2ClientSettings {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        },
        is_local_creds: config.is_local_creds,
    }
}

/// Read `CLASP_EXPIRY_DATE` the way JavaScript's `Number()` would.
///
/// Blank means 0 and exponent forms like `1e3` are accepted. Anything that
/// is not a whole finite number is unknown.
fn parse_expiry(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }

    let value = raw.parse::<f64>().ok()?;
    let whole = value.is_finite() && value.fract() == 0.0;
    let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
    (whole && in_range).then_some(value as i64)
}

/// Write the credentials described by `config` to `file`, returning the path written
pub fn export_credentials(
    config: &ExportConfig,
    file: &CredentialsFile,
) -> Result<PathBuf, CredentialsError> {
    let missing = config.missing();
    if !missing.is_empty() {
        warn!(?missing, "some CLASP_* variables are not set");
    }

    let path = file.write(&build_credentials(config))?;
    info!(path = %path.display(), "credentials written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_config() -> ExportConfig {
        ExportConfig {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            scope: Some("scope".to_string()),
            token_type: Some("Bearer".to_string()),
            id_token: Some("id".to_string()),
            expiry_date: Some("1700000000000".to_string()),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_uri: Some("http://localhost".to_string()),
            is_local_creds: true,
        }
    }

    #[test]
    fn test_build_credentials() {
        let creds = build_credentials(&full_config());
        assert_eq!(creds.token.access_token.as_deref(), Some("access"));
        assert_eq!(creds.token.expiry_date, Some(1_700_000_000_000));
        assert_eq!(
            creds.oauth2_client_settings.redirect_uri.as_deref(),
            Some("http://localhost")
        );
        assert!(creds.is_local_creds);
    }

    #[test]
    fn test_invalid_expiry_is_null() {
        let config = ExportConfig {
            expiry_date: Some("abc".to_string()),
            ..full_config()
        };
        let creds = build_credentials(&config);
        assert_eq!(creds.token.expiry_date, None);

        let value = serde_json::to_value(&creds).unwrap();
        assert!(value["token"]["expiry_date"].is_null());
    }

    #[test]
    fn test_expiry_follows_number_semantics() {
        assert_eq!(parse_expiry("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_expiry(" 42 "), Some(42));
        assert_eq!(parse_expiry(""), Some(0));
        assert_eq!(parse_expiry("   "), Some(0));
        assert_eq!(parse_expiry("1e3"), Some(1000));
        assert_eq!(parse_expiry("-5"), Some(-5));
        assert_eq!(parse_expiry("abc"), None);
        assert_eq!(parse_expiry("1.5"), None);
        assert_eq!(parse_expiry("NaN"), None);
        assert_eq!(parse_expiry("inf"), None);
    }

    #[test]
    fn test_empty_expiry_is_zero() {
        let config = ExportConfig {
            expiry_date: Some(String::new()),
            ..full_config()
        };
        assert_eq!(build_credentials(&config).token.expiry_date, Some(0));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let file = CredentialsFile::at(dir.path().join(".clasprc.json"));

        let path = export_credentials(&full_config(), &file).unwrap();
        assert_eq!(path, dir.path().join(".clasprc.json"));

        let written = file.read().unwrap();
        assert_eq!(written, build_credentials(&full_config()));
    }

    #[test]
    fn test_export_from_empty_environment() {
        let dir = TempDir::new().unwrap();
        let file = CredentialsFile::at(dir.path().join(".clasprc.json"));

        export_credentials(&ExportConfig::from_lookup(|_| None), &file).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&file.read_raw().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "token": {"expiry_date": null},
                "oauth2ClientSettings": {},
                "isLocalCreds": false
            })
        );
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".clasprc.json");
        std::fs::write(&path, r#"{"stale": true}"#).unwrap();

        export_credentials(&full_config(), &CredentialsFile::at(&path)).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("stale"));
    }
}
