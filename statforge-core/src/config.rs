//! Import configuration for the command-line tools.
//!
//! Supports TOML configuration files like:
//! ```toml
//! include_legacy = false
//! dedupe = true
//! skip_incomplete = true
//! output_dir = "data/spells"
//! ```

use crate::error::{Result, StatforgeError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How bulk imports are filtered and where parsed records are written.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Keep spells marked "Legacy" in bulk imports.
    pub include_legacy: bool,
    /// Collapse spells that share a key, preferring non-legacy versions.
    pub dedupe: bool,
    /// Drop bulk entries with no description (locked or partial previews).
    pub skip_incomplete: bool,
    /// Directory for `--write`; records are stored as `<dir>/<key>`.
    pub output_dir: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            include_legacy: false,
            dedupe: true,
            skip_incomplete: true,
            output_dir: None,
        }
    }
}

impl ImportConfig {
    /// Load import configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StatforgeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read import config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse import configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StatforgeError::Config(format!("Failed to parse import config TOML: {}", e)))
    }

    /// Configuration from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
