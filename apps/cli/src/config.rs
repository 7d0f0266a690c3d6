//! CLI configuration loading and merging.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. File passed with `--config`
//! 3. Local config file (./.wayfarerrc)
//! 4. Global config file (~/.wayfarer/config.toml)
//! 5. Defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use wayfarer_driver::DriverConfig;

/// Chat model settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSection {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Embedding model settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// CLI configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub chat: ChatSection,

    #[serde(default)]
    pub embedding: EmbeddingSection,

    /// Raw `[driver]` table; merged key by key, parsed on use
    #[serde(default)]
    pub driver: toml::Table,
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Global configuration file path.
    pub fn default_global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".wayfarer").join("config.toml"))
    }

    /// Local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".wayfarerrc")
    }

    /// Discover and load configuration files.
    ///
    /// Missing global or local files are skipped; an explicit file must exist.
    pub fn discover_and_load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let discovered = Self::default_global_path().into_iter().chain([Self::default_local_path()]);
        for path in discovered {
            if path.is_file() {
                debug!(path = %path.display(), "Loading configuration");
                config.merge(&Self::load_from_file(&path)?);
            }
        }

        if let Some(path) = explicit {
            config.merge(&Self::load_from_file(path)?);
        }

        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }

        if other.chat.provider.is_some() {
            self.chat.provider.clone_from(&other.chat.provider);
        }
        if other.chat.model.is_some() {
            self.chat.model.clone_from(&other.chat.model);
        }
        if other.chat.base_url.is_some() {
            self.chat.base_url.clone_from(&other.chat.base_url);
        }
        if other.chat.temperature.is_some() {
            self.chat.temperature = other.chat.temperature;
        }

        if other.embedding.provider.is_some() {
            self.embedding.provider.clone_from(&other.embedding.provider);
        }
        if other.embedding.model.is_some() {
            self.embedding.model.clone_from(&other.embedding.model);
        }
        if other.embedding.base_url.is_some() {
            self.embedding.base_url.clone_from(&other.embedding.base_url);
        }

        merge_tables(&mut self.driver, &other.driver);
    }

    /// Driver configuration from the merged `[driver]` table.
    pub fn driver_config(&self) -> Result<DriverConfig> {
        let mut document = toml::Table::new();
        document.insert("driver".to_string(), toml::Value::Table(self.driver.clone()));
        let content = toml::to_string(&document).context("Failed to serialize [driver] configuration")?;

        let mut config = DriverConfig::from_toml_str(&content)?;
        if config.parameters.temperature.is_none() {
            config.parameters.temperature = self.chat.temperature;
        }
        Ok(config)
    }
}

/// Merge `overlay` into `base`, descending into tables present in both.
fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
