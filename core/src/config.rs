//! Configuration management.
//!
//! Stores settings in JSON format at `~/.airspy/config.json`. Every field
//! has a default, so a partial or missing file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapters::{DEFAULT_HANDSHAKE_DIR, DEFAULT_VENDOR_URL};
use crate::application::{AuditSettings, MonitorSettings, DEFAULT_AUDIT_FILE};
use crate::domain::{RadioConfig, DEFAULT_DEVICE, DEFAULT_FREQUENCY};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Monitor-mode wireless interface.
    pub interface: String,

    /// Run capture and attack tools through `sudo`.
    pub sudo: bool,

    pub vendor: VendorSettings,
    pub radio: RadioSettings,
    pub audit: AuditConfig,
    pub monitor: MonitorConfig,
    pub handshake: HandshakeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: "wlan0mon".to_string(),
            sudo: true,
            vendor: VendorSettings::default(),
            radio: RadioSettings::default(),
            audit: AuditConfig::default(),
            monitor: MonitorConfig::default(),
            handshake: HandshakeConfig::default(),
        }
    }
}

/// MAC vendor API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VendorSettings {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_VENDOR_URL.to_string(),
            timeout_ms: 2000,
        }
    }
}

/// Decoder defaults for `radio` and `monitor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadioSettings {
    pub device: String,
    pub frequency: String,
    pub gain: Option<String>,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            frequency: DEFAULT_FREQUENCY.to_string(),
            gain: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub file: PathBuf,
    pub wifi_secs: u64,
    pub bluetooth_secs: u64,
    pub radio_secs: u64,
    pub frequencies: Vec<String>,
    pub event_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let settings = AuditSettings::default();
        Self {
            file: PathBuf::from(DEFAULT_AUDIT_FILE),
            wifi_secs: settings.wifi_duration.as_secs(),
            bluetooth_secs: settings.bluetooth_duration.as_secs(),
            radio_secs: settings.radio_duration.as_secs(),
            frequencies: settings.frequencies,
            event_limit: settings.event_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub rf_window_secs: u64,
    pub wifi_secs: u64,
    pub bluetooth_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let settings = MonitorSettings::default();
        Self {
            interval_secs: settings.interval.as_secs(),
            rf_window_secs: settings.rf_window.as_secs(),
            wifi_secs: settings.wifi_duration.as_secs(),
            bluetooth_secs: settings.bluetooth_duration.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandshakeConfig {
    /// Where confirmed handshakes are copied.
    pub dir: PathBuf,
    pub duration_secs: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_HANDSHAKE_DIR),
            duration_secs: 30,
        }
    }
}

impl Config {
    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_millis(self.vendor.timeout_ms)
    }

    /// Decoder settings at `frequency`, or the configured default.
    pub fn radio_config(&self, frequency: Option<&str>) -> RadioConfig {
        RadioConfig {
            frequency: frequency.unwrap_or(&self.radio.frequency).to_string(),
            gain: self.radio.gain.clone(),
            device: self.radio.device.clone(),
            ..RadioConfig::default()
        }
    }

    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            wifi_duration: Duration::from_secs(self.audit.wifi_secs),
            bluetooth_duration: Duration::from_secs(self.audit.bluetooth_secs),
            radio_duration: Duration::from_secs(self.audit.radio_secs),
            frequencies: self.audit.frequencies.clone(),
            event_limit: self.audit.event_limit,
            radio: self.radio_config(None),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            wifi_duration: Duration::from_secs(self.monitor.wifi_secs),
            bluetooth_duration: Duration::from_secs(self.monitor.bluetooth_secs),
            rf_window: Duration::from_secs(self.monitor.rf_window_secs),
            interval: Duration::from_secs(self.monitor.interval_secs),
            radio: self.radio_config(None),
        }
    }
}

/// Configuration store for reading and writing the config file.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a config store with the default path, `~/.airspy/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".airspy").join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns the defaults if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk, creating the directory if needed.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Write the defaults. Refuses to replace an existing file unless `force`.
    pub async fn init(&self, force: bool) -> Result<Config> {
        if !force && fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Err(Error::Config(format!(
                "{} already exists",
                self.config_path.display()
            )));
        }
        let config = Config::default();
        self.save(&config).await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".airspy").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let config = store.load().await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.interface, "wlan0mon");
        assert!(config.sudo);
        assert_eq!(config.audit.frequencies, vec!["433.92M", "868M"]);
        assert_eq!(config.monitor.interval_secs, 300);
        assert_eq!(config.monitor.rf_window_secs, 10);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store();

        let mut config = Config::default();
        config.interface = "wlan1mon".to_string();
        config.audit.event_limit = 25;
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"interface":"mon0","audit":{"radioSecs":5}}"#).unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.interface, "mon0");
        assert!(config.sudo);
        assert_eq!(config.audit.radio_secs, 5);
        assert_eq!(config.audit.wifi_secs, 10);
        assert_eq!(config.audit_settings().radio_duration, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let (store, _dir) = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let (store, _dir) = test_store();
        store.init(false).await.unwrap();
        assert!(matches!(store.init(false).await, Err(Error::Config(_))));
        assert!(store.init(true).await.is_ok());
    }

    #[test]
    fn test_radio_config_override() {
        let config = Config::default();
        assert_eq!(config.radio_config(None).frequency, "433.92M");
        let radio = config.radio_config(Some("915M"));
        assert_eq!(radio.frequency, "915M");
        assert_eq!(radio.device, "soapy");
    }
}
