//! clasprc-sync - Keep CI's clasp login in step with yours
//!
//! `clasp login` leaves an OAuth token cache in `~/.clasprc.json`. This tool
//! stores that file, base64-encoded, as the `CLASPRC_JSON` Actions secret of
//! a GitHub repository so workflows can push Apps Script code without
//! credentials in the repo. All GitHub traffic goes through the `gh` CLI.

pub mod export;
pub mod sync;

pub use export::{build_credentials, export_credentials};
pub use sync::{
    encode_payload, validate_repo, DeleteOutcome, RepoAccess, SecretSync, SyncError, SECRET_NAME,
};
