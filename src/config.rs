use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings file, read once at startup. Section and key names match the
/// historical config file this tool has always shipped with.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    #[serde(rename = "Google")]
    pub google: GoogleSettings,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoogleSettings {
    #[serde(rename = "APIKey")]
    pub api_key: String,
    #[serde(rename = "BaseURL", default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse settings from {}", path.display()))
    }
}
