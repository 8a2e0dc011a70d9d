//! clasprc-sync - Sync clasp credentials into GitHub Actions secrets
//!
//! Commands:
//! - check: Verify the repository exists and you can push to it
//! - upload: Store ~/.clasprc.json as the CLASPRC_JSON secret
//! - delete: Remove the CLASPRC_JSON secret
//! - export: Write ~/.clasprc.json from CLASP_* variables (CI side)
//! - path: Print the credentials file location
//! - status: Show whether credentials exist and when the token expires

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use clasprc_core::{Config, CredentialsFile, Executor, ExportConfig, GhCli, Paths, SystemExecutor};
use clasprc_sync::{
    export_credentials, validate_repo, DeleteOutcome, SecretSync, SyncError, SECRET_NAME,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clasprc-sync")]
#[command(about = "Sync clasp credentials (~/.clasprc.json) into GitHub Actions secrets")]
#[command(version)]
#[command(after_help = r#"REPOSITORY:
    Commands that talk to GitHub take --repo owner/name. Without it the
    default_repo from ~/.config/clasprc-sync/config.json is used, then the
    repository of the current directory (via `gh repo view`).

REQUIREMENTS:
    - GitHub CLI (gh), logged in with `gh auth login`
    - A clasp login (`clasp login`) for upload

CI:
    The secret holds the base64-encoded file. Decode it in a workflow with
    `echo "$CLASPRC_JSON" | base64 -d > ~/.clasprc.json`, or set the
    CLASP_* variables and run `clasprc-sync export`."#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the repository exists and you can push to it
    Check {
        /// Target repository (owner/name)
        #[arg(short = 'R', long, value_parser = validate_repo)]
        repo: Option<String>,
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Upload ~/.clasprc.json as the CLASPRC_JSON secret
    Upload {
        /// Target repository (owner/name)
        #[arg(short = 'R', long, value_parser = validate_repo)]
        repo: Option<String>,
        /// Upload without checking push access first
        #[arg(long)]
        skip_check: bool,
    },

    /// Delete the CLASPRC_JSON secret
    Delete {
        /// Target repository (owner/name)
        #[arg(short = 'R', long, value_parser = validate_repo)]
        repo: Option<String>,
    },

    /// Write ~/.clasprc.json from CLASP_* environment variables
    Export,

    /// Print the credentials file path
    Path,

    /// Show local credentials status (never prints token values)
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = Paths::new();
    let config = Config::load(&paths.config_file())?;
    let sync = SecretSync::new(
        GhCli::with_program(SystemExecutor, config.gh_program.clone()),
        CredentialsFile::home(),
    );

    match cli.command {
        Commands::Check { repo, json } => cmd_check(&sync, &config, repo, json),
        Commands::Upload { repo, skip_check } => cmd_upload(&sync, &config, repo, skip_check),
        Commands::Delete { repo } => cmd_delete(&sync, &config, repo),
        Commands::Export => cmd_export(sync.credentials()),
        Commands::Path => cmd_path(sync.credentials()),
        Commands::Status { json } => cmd_status(sync.credentials(), json),
    }
}

/// Pick the target repository: flag, then config, then the current directory
fn resolve_repo<E: Executor>(
    sync: &SecretSync<E>,
    config: &Config,
    repo: Option<String>,
) -> Result<String> {
    if let Some(repo) = repo {
        return Ok(repo);
    }

    if let Some(repo) = &config.default_repo {
        return validate_repo(repo)
            .map_err(anyhow::Error::msg)
            .context("Invalid default_repo in config");
    }

    Ok(sync.detect_repo()?)
}

/// Check repository access
fn cmd_check(
    sync: &SecretSync<SystemExecutor>,
    config: &Config,
    repo: Option<String>,
    json: bool,
) -> Result<()> {
    let repo = resolve_repo(sync, config, repo)?;
    let access = sync.check_repo_access(&repo);

    if json {
        println!("{}", serde_json::to_string_pretty(&access)?);
    } else if let Some(error) = &access.error {
        println!("error: {}: {}", repo, error);
    } else if access.can_push {
        println!("success: {} exists and you can push to it", repo);
    } else {
        println!("warning: {} exists but you do not have push access", repo);
    }

    if !access.can_push {
        std::process::exit(1);
    }

    Ok(())
}

/// Upload the credentials file
fn cmd_upload(
    sync: &SecretSync<SystemExecutor>,
    config: &Config,
    repo: Option<String>,
    skip_check: bool,
) -> Result<()> {
    match upload(sync, config, repo, skip_check) {
        Ok(repo) => {
            println!("success: Uploaded {} to {}", SECRET_NAME, repo);
            Ok(())
        }
        Err(e) => {
            let sync_error = e.downcast_ref::<SyncError>();
            if let Some(missing @ SyncError::MissingCredentialsFile(_)) = sync_error {
                eprintln!("error: {}", missing);
                std::process::exit(1);
            }
            Err(e)
        }
    }
}

/// Resolve, check and upload, returning the repository written to.
///
/// A missing credentials file fails before any gh call.
fn upload<E: Executor>(
    sync: &SecretSync<E>,
    config: &Config,
    repo: Option<String>,
    skip_check: bool,
) -> Result<String> {
    if !sync.credentials().exists() {
        return Err(SyncError::MissingCredentialsFile(sync.credentials().path()).into());
    }

    let repo = resolve_repo(sync, config, repo)?;

    if !skip_check {
        let access = sync.check_repo_access(&repo);
        if let Some(error) = access.error {
            anyhow::bail!("{}: {}", repo, error);
        }
        if !access.can_push {
            anyhow::bail!("No push access to {} - cannot set secrets", repo);
        }
    }

    sync.upload_secrets(&repo)
        .with_context(|| format!("Failed to upload {} to {}", SECRET_NAME, repo))?;

    Ok(repo)
}

/// Delete the secret
fn cmd_delete(
    sync: &SecretSync<SystemExecutor>,
    config: &Config,
    repo: Option<String>,
) -> Result<()> {
    let repo = resolve_repo(sync, config, repo)?;

    match sync.delete_secrets(&repo) {
        DeleteOutcome::Deleted => println!("success: Deleted {} from {}", SECRET_NAME, repo),
        DeleteOutcome::NotDeleted { .. } => println!(
            "warning: Failed to delete {} from GitHub Secrets (may not exist)",
            SECRET_NAME
        ),
    }

    Ok(())
}

/// Write credentials from the environment
fn cmd_export(file: &CredentialsFile) -> Result<()> {
    let config = ExportConfig::from_env();
    let path = export_credentials(&config, file)?;
    println!("success: Wrote {}", path.display());
    Ok(())
}

/// Print the credentials path
fn cmd_path(file: &CredentialsFile) -> Result<()> {
    println!("{}", file.path().display());
    Ok(())
}

/// Show credentials status
fn cmd_status(file: &CredentialsFile, json: bool) -> Result<()> {
    let path = file.path();

    if !file.exists() {
        if json {
            println!("{}", json!({ "path": path, "exists": false }));
        } else {
            println!("No credentials at {}. Run `clasp login` first.", path.display());
        }
        return Ok(());
    }

    let creds = file.read()?;
    let expiry = creds
        .token
        .expiry_date
        .and_then(DateTime::<Utc>::from_timestamp_millis);
    let expired = expiry.map(|e| e <= Utc::now());

    if json {
        let status = json!({
            "path": path,
            "exists": true,
            "hasRefreshToken": creds.token.refresh_token.is_some(),
            "expiry": expiry.map(|e| e.to_rfc3339()),
            "expired": expired,
            "isLocalCreds": creds.is_local_creds,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Credentials: {}", path.display());
    match (expiry, expired) {
        (Some(e), Some(true)) => {
            println!("  Access token: expired {}", e.format("%Y-%m-%d %H:%M UTC"))
        }
        (Some(e), _) => {
            println!("  Access token: valid until {}", e.format("%Y-%m-%d %H:%M UTC"))
        }
        _ => println!("  Access token: no expiry recorded"),
    }
    let refresh = if creds.token.refresh_token.is_some() {
        "present"
    } else {
        "missing"
    };
    println!("  Refresh token: {}", refresh);
    if creds.is_local_creds {
        println!("  Local credentials (project-specific OAuth client)");
    }

    Ok(())
}
