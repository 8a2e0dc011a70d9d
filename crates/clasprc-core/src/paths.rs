//! Standard paths used by clasprc-sync

use std::path::PathBuf;

/// File name of the clasp credentials cache
pub const CLASPRC_FILE: &str = ".clasprc.json";

/// Platform family, decides which variable holds the home directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Environment variable holding the home directory
    pub fn home_var(&self) -> &'static str {
        match self {
            Self::Windows => "USERPROFILE",
            Self::Unix => "HOME",
        }
    }

    pub fn separator(&self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Unix => '/',
        }
    }
}

/// Path of the credentials file for this process's platform and environment.
///
/// Recomputed on every call so changes to the environment are picked up.
pub fn clasprc_path() -> PathBuf {
    clasprc_path_for(Platform::current(), |name| std::env::var(name).ok())
}

/// Path of the credentials file for `platform`, resolving variables with `lookup`.
///
/// The platform's own separator is used, so a Windows path is produced
/// correctly even when evaluated elsewhere. When the home variable is unset
/// or empty, falls back to the OS home directory and then to a bare file name.
pub fn clasprc_path_for<F>(platform: Platform, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let home = lookup(platform.home_var())
        .filter(|h| !h.is_empty())
        .or_else(|| dirs::home_dir().map(|h| h.to_string_lossy().into_owned()));

    match home {
        Some(home) => {
            let sep = platform.separator();
            let trimmed = home.trim_end_matches(['/', sep]);
            let base = if trimmed.is_empty() { &home[..1] } else { trimmed };
            if base.ends_with(sep) {
                PathBuf::from(format!("{}{}", base, CLASPRC_FILE))
            } else {
                PathBuf::from(format!("{}{}{}", base, sep, CLASPRC_FILE))
            }
        }
        None => PathBuf::from(CLASPRC_FILE),
    }
}

/// Standard clasprc-sync paths
pub struct Paths {
    /// Config directory (~/.config/clasprc-sync)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("clasprc-sync");

        Self { config }
    }

    /// Tool configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}
