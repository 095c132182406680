//! Application configuration management utilities.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Game update dump (contains `Actor/ActorInfo.product.sbyml`).
    pub update_dir: Option<Utf8PathBuf>,
    /// Game DLC dump (contains `Map/...`).
    pub dlc_dir: Option<Utf8PathBuf>,
    /// Catalog data and actor pack cache. Defaults to `Data/` next to the executable.
    pub data_dir: Option<Utf8PathBuf>,
    pub remote_base_url: Option<String>,
    pub jobs: Option<usize>,
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns a config file path located next to the executable.
pub fn config_path(file_name: &str) -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(file_name))
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_path("config.toml")
}

/// Returns the default data directory (`Data/` next to the executable).
pub fn default_data_dir() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("Data"))
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    if let Some(path) = default_config_path() {
        if path.as_std_path().exists() {
            match fs::read_to_string(path.as_std_path()) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => tracing::warn!("Ignoring malformed config {}: {}", path, e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path, e),
            }
        }
    }
    AppConfig::default()
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    if let Some(path) = default_config_path() {
        let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
        fs::write(path.as_std_path(), content)
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine config path",
        ))
    }
}
