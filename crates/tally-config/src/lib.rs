use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::ImageDetail;

/// Simple configuration for tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model id used when none is given; empty resolves to the fallback encoding
    #[serde(default)]
    pub default_model: String,

    /// Encoding for unrecognized models
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,

    /// Default truncation budget
    #[serde(default = "default_budget")]
    pub budget_tokens: usize,

    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Detail applied to image parts that don't specify one
    #[serde(default)]
    pub default_detail: ImageDetail,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: String::new(),
            fallback_encoding: default_fallback_encoding(),
            budget_tokens: default_budget(),
            image: ImageConfig::default(),
        }
    }
}

fn default_fallback_encoding() -> String {
    "cl100k_base".to_string()
}

fn default_budget() -> usize {
    4096
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "tally", "tally") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.tally/config.toml")
        }
    }
}
