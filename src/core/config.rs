//! Composer configuration
//!
//! Settings for loading definition files and for the command-line tool.
//! Every field has a default, so a config file only needs the keys it changes.

use crate::core::error::{ComposeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for definition loading and logging
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Directory scanned for definition files when no path is given
    pub definitions_dir: PathBuf,

    /// File extension (without the dot) of definition files
    ///
    /// Other files in the definitions directory are ignored.
    pub definition_extension: String,

    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("definitions"),
            definition_extension: "toml".to_string(),
            log_filter: "blueprint_composer=info".to_string(),
        }
    }
}

impl ComposerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ComposeError::ParseError(e.to_string()))
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ComposeError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Whether `path` has the configured definition extension
    pub fn is_definition_file(&self, path: &Path) -> bool {
        path.extension()
            .map_or(false, |ext| ext == self.definition_extension.as_str())
    }
}
