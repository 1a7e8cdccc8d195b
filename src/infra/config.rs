use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_model_title() -> String {
    "redline".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_model_title")]
    pub model_title: String,
    #[serde(default)]
    pub include_rules_in_system_message: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_title: default_model_title(),
            include_rules_in_system_message: false,
        }
    }
}

pub fn load_config() -> EngineConfig {
    load_config_from(&config_path())
}

pub fn save_config(config: &EngineConfig) -> std::io::Result<()> {
    save_config_to(config, &config_path())
}

fn load_config_from(path: &Path) -> EngineConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return EngineConfig::default();
    };
    toml::from_str(&contents).unwrap_or_default()
}

fn save_config_to(config: &EngineConfig, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).unwrap_or_default();
    std::fs::write(path, contents)
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REDLINE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redline")
        .join("config.toml")
}
