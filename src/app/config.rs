use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "ANDROID_MIRROR_CONFIG_PATH";

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolSettings {
    /// Directory holding the bundled `adb` and `scrcpy` binaries. Relative
    /// values are resolved against the application directory.
    pub dependencies_dir: String,
    pub adb_path: String,
    pub scrcpy_path: String,
    pub command_timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            dependencies_dir: "dependencies".to_string(),
            adb_path: String::new(),
            scrcpy_path: String::new(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrcpySettings {
    pub stay_awake: bool,
    pub turn_screen_off: bool,
    pub max_size: u32,
    pub bit_rate: String,
    pub extra_args: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// `auto`, `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub scrcpy: ScrcpySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools: ToolSettings::default(),
            scrcpy: ScrcpySettings::default(),
            logging: LoggingSettings::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(path);
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("android_mirror").join("config.json"),
        None => PathBuf::from("android_mirror_config.json"),
    }
}

pub fn backup_config_path(path: &Path) -> PathBuf {
    path.with_extension("backup.json")
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), ""))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::system(format!("Failed to parse config: {err}"), ""))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| AppError::system(format!("Failed to create config dir: {err}"), ""))?;
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), ""))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), ""))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    if config.tools.command_timeout_secs == 0 {
        config.tools.command_timeout_secs = DEFAULT_COMMAND_TIMEOUT_SECS;
    }
    if config.tools.dependencies_dir.trim().is_empty() {
        config.tools.dependencies_dir = ToolSettings::default().dependencies_dir;
    }
    let format = config.logging.format.trim().to_lowercase();
    config.logging.format = match format.as_str() {
        "auto" | "pretty" | "json" => format,
        _ => "auto".to_string(),
    };
    config
}
