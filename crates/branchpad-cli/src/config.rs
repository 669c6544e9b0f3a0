//! CLI configuration file
//!
//! A TOML file with two optional tables:
//!
//! ```toml
//! notebook = "analysis.branchpad.json"
//!
//! [engine]
//! max_sweep_combinations = 500
//!
//! [interpreter]
//! installable_packages = ["numpy", "polars"]
//! random_seed = 7
//! ```

use branchpad_core::NotebookConfig;
use branchpad_lang::PadConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Notebook file used when neither the flag nor the config names one
pub const DEFAULT_NOTEBOOK_FILE: &str = "notebook.branchpad.json";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Everything the CLI can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Notebook file to operate on
    pub notebook: Option<PathBuf>,
    /// Engine settings
    pub engine: NotebookConfig,
    /// Pad interpreter settings
    pub interpreter: PadConfig,
}

impl CliConfig {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns `ConfigError::Toml` for malformed input.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is unreadable or malformed.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Notebook path: explicit flag, then config, then the default name
    #[must_use]
    pub fn notebook_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.notebook.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTEBOOK_FILE))
    }
}
