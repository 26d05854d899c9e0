//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `GDRIVE_*` environment variables.

use anyhow::{Context, Result};
use drive_adapters::{
    GoogleDriveConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_BASE,
};
use drive_core::config::DEFAULT_MAX_DOWNLOAD_BYTES;
use drive_core::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "GDRIVE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// OAuth bearer token for the Drive API
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_upload_base")]
    pub upload_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_upload_base() -> String {
    DEFAULT_UPLOAD_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_download_bytes() -> u64 {
    DEFAULT_MAX_DOWNLOAD_BYTES
}

impl Settings {
    pub fn drive_config(&self) -> GoogleDriveConfig {
        GoogleDriveConfig {
            api_base: self.api_base.trim_end_matches('/').to_string(),
            upload_base: self.upload_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::default().with_max_download_bytes(self.max_download_bytes)
    }
}

pub struct SettingsManager;

impl SettingsManager {
    /// Get the gateway home directory (~/.gdrive-gateway)
    pub fn home() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("GDRIVE_GATEWAY_HOME") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".gdrive-gateway"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load settings from `path` (or the default path) and the environment.
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::settings_path()?,
        };

        let settings: Settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_path()).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read settings from {:?}", path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base = \"http://localhost:9000/drive/v3/\"\ntimeout_secs = 5\n",
        )?;

        let settings = SettingsManager::load(Some(&path))?;
        let drive = settings.drive_config();
        assert_eq!(drive.api_base, "http://localhost:9000/drive/v3");
        assert_eq!(drive.timeout, Duration::from_secs(5));
        assert_eq!(drive.upload_base, DEFAULT_UPLOAD_BASE);
        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let settings = SettingsManager::load(Some(&temp_dir.path().join("absent.toml")))?;
        assert_eq!(
            settings.gateway_config().max_download_bytes,
            DEFAULT_MAX_DOWNLOAD_BYTES
        );
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_reported() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n")?;

        assert!(SettingsManager::load(Some(&path)).is_err());
        Ok(())
    }
}
