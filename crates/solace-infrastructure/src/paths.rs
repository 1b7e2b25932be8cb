//! Unified path management for Solace durable state.
//!
//! All local state lives in a single TOML file under the platform config
//! directory, so the same layout works on Linux, macOS and Windows.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Solace.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/solace/            # Config directory
/// └── state.toml               # Durable local state (session mirror,
///                              # consent flags, schedule, endpoint override)
/// ```
pub struct SolacePaths;

impl SolacePaths {
    /// Returns the Solace configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("solace"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the durable state file.
    pub fn state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("state.toml"))
    }
}
