use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manifest::SourceImage;


#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Auth file to read registry credentials from
    pub auth_file: Option<PathBuf>,

    /// Registries reached over plain HTTP
    #[serde(default)]
    pub insecure_registries: Vec<String>,

    /// Reference the index is published to
    pub destination: Option<String>,

    /// Source images, in index order
    #[serde(default)]
    pub images: Vec<SourceImage>,
}

impl Config {
    /// Load from `path`, or from the user config directory when `path` is None
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::from_file(&config_path);
            }
        }
        Ok(Config::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("multiarch").join("config.toml"))
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
