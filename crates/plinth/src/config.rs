//! Startup configuration (`plinth.toml`).

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use plinth_pipeline::Paths;

pub const CONFIG_FILE: &str = "plinth.toml";

/// Configuration file structure (plinth.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub paths: Paths,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub host: String,
    pub open: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Load configuration from plinth.toml if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load() -> Result<ConfigFile> {
    load_from(Path::new(CONFIG_FILE))
}

fn load_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let config: ConfigFile = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;

    tracing::info!("loaded config from {}", path.display());
    Ok(config)
}
