//! Provider configuration and desired-state manifests.

use crate::domain::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings shared by every operation of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Interpreter used by [`PowerShellRunner`](crate::channel::PowerShellRunner).
    pub powershell: PathBuf,

    /// Check that a local physical path exists before creating or updating.
    ///
    /// The check runs on the machine driving the pass, so it only makes
    /// sense when that machine is the IIS host.
    pub verify_local_paths: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            powershell: PathBuf::from(Self::DEFAULT_POWERSHELL),
            verify_local_paths: false,
        }
    }
}

impl ProviderConfig {
    pub const DEFAULT_POWERSHELL: &'static str = "powershell.exe";
    pub const POWERSHELL_ENV: &'static str = "IIS_VDIR_POWERSHELL";
    pub const VERIFY_LOCAL_PATHS_ENV: &'static str = "IIS_VDIR_VERIFY_LOCAL_PATHS";

    /// Reads the configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(Self::POWERSHELL_ENV).filter(|p| !p.trim().is_empty()) {
            config.powershell = PathBuf::from(path);
        }
        if let Some(flag) = lookup(Self::VERIFY_LOCAL_PATHS_ENV) {
            config.verify_local_paths = parse_flag(&flag);
        }
        config
    }

    pub fn with_powershell(mut self, path: impl Into<PathBuf>) -> Self {
        self.powershell = path.into();
        self
    }

    pub fn with_verify_local_paths(mut self, verify: bool) -> Self {
        self.verify_local_paths = verify;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Errors loading a desired-state manifest.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read manifest {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse manifest {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Parses a manifest: a JSON list of descriptors, or a single descriptor.
pub fn parse_manifest(text: &str, origin: &str) -> Result<Vec<ResourceDescriptor>, ConfigError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Manifest {
        Many(Vec<ResourceDescriptor>),
        One(ResourceDescriptor),
    }

    let manifest: Manifest = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        reason: e.to_string(),
    })?;
    Ok(match manifest {
        Manifest::Many(list) => list,
        Manifest::One(single) => vec![single],
    })
}

/// Reads and parses the manifest at `path`.
pub async fn load_manifest(path: &Path) -> Result<Vec<ResourceDescriptor>, ConfigError> {
    let origin = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
    parse_manifest(&text, &origin)
}
