//! Configuration file support for hkseries.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/hkseries/config.toml`.

use crate::pool::PoolConfig;
use crate::series::{SeriesOptions, SourceFilter, TypeMatch};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Loading and series building parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Worker threads; unset means one per CPU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    #[serde(default = "default_remove_duplicates")]
    pub remove_duplicates: bool,

    /// Sources allowed in series; empty means all
    #[serde(default)]
    pub sources: Vec<String>,

    /// Group record types by substring containment instead of equality
    #[serde(default)]
    pub substring_match: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            remove_duplicates: default_remove_duplicates(),
            sources: Vec::new(),
            substring_match: false,
        }
    }
}

/// Output location configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

// Default value functions
fn default_remove_duplicates() -> bool {
    true
}

fn default_out_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".local/share"));
    base.join("hkseries")
}

impl PipelineConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            threads: self.threads,
        }
    }

    pub fn series_options(&self) -> Result<SeriesOptions> {
        let sources = if self.sources.is_empty() {
            SourceFilter::All
        } else {
            SourceFilter::only(self.sources.iter().cloned())
                .map_err(|e| Error::Config(format!("pipeline.sources: {}", e)))?
        };

        Ok(SeriesOptions {
            remove_duplicates: self.remove_duplicates,
            sources,
            type_match: if self.substring_match {
                TypeMatch::Substring
            } else {
                TypeMatch::Exact
            },
        })
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            other => {
                tracing::info!("No config file found at {:?}, using defaults", other);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        if config.pipeline.threads == Some(0) {
            return Err(Error::Config("pipeline.threads must be at least 1".into()));
        }
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("hkseries").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
