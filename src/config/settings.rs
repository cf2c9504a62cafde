//! Application configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::DEFAULT_REFRESH_INTERVAL;
use accel_sens_types::TelemetryConfig;

fn default_version() -> u32 {
    1
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_millis() as u64
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Period between full refreshes
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Probe paths, tools and heuristics (`paths`, `tools`, `heuristics` keys)
    #[serde(flatten)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "github.accel_sens", "accel-sens")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            refresh_interval_ms: default_refresh_interval_ms(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_sens_types::HostPaths;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.refresh_interval(), Duration::from_secs(2));
        assert_eq!(config.telemetry.tools.nvidia_smi, "nvidia-smi");
        assert_eq!(config.telemetry.tools.lspci, "lspci");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "refresh_interval_ms": 500,
            "tools": { "nvidia_timeout_ms": 1000 },
            "paths": { "devfreq_class": "/tmp/devfreq" }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.refresh_interval_ms, 500);
        assert_eq!(config.telemetry.tools.nvidia_timeout(), Duration::from_secs(1));
        assert_eq!(config.telemetry.tools.pci_lookup_timeout_ms, 2000);
        assert_eq!(config.telemetry.paths.devfreq_class, PathBuf::from("/tmp/devfreq"));
        assert_eq!(config.telemetry.paths.drm_class, PathBuf::from("/sys/class/drm"));
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.json");

        let mut config = AppConfig::default();
        config.refresh_interval_ms = 750;
        config.telemetry.paths = HostPaths::with_root("/srv/capture");
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from_path(&dir.path().join("absent.json")).is_err());
    }
}
