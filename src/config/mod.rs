//! Configuration management for Pad Remote
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::input::gamepad::normalize::XINPUT_STICK_DEADZONE;
use crate::mapping::{BindingRecord, RuleSet};
use crate::remote::{DEFAULT_REMOTE_PORT, MIN_REMOTE_PORT};

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Poll loop period in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Saved bindings; entries not listed keep their defaults
    #[serde(default = "default_bindings")]
    pub bindings: Vec<BindingRecord>,
}

/// Controller input configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GamepadConfig {
    /// XInput stick deadzone (raw units, 0-32767)
    #[serde(default = "default_deadzone")]
    pub deadzone: i32,
    /// Minimum delay between two reconnection attempts
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_ms: u64,
}

/// Remote HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_remote_port")]
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            gamepad: GamepadConfig::default(),
            remote: RemoteConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            reconnect_interval_ms: default_reconnect_interval(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_remote_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 1000 {
            anyhow::bail!(
                "poll_interval_ms {} is out of range (must be 1-1000)",
                self.poll_interval_ms
            );
        }

        if !(0..=i32::from(i16::MAX)).contains(&self.gamepad.deadzone) {
            anyhow::bail!(
                "gamepad.deadzone {} is out of range (must be 0-32767)",
                self.gamepad.deadzone
            );
        }

        if self.gamepad.reconnect_interval_ms == 0 {
            anyhow::bail!("gamepad.reconnect_interval_ms must be greater than 0");
        }

        if self.remote.port < MIN_REMOTE_PORT {
            anyhow::bail!(
                "remote.port {} is invalid (must be {}-65535)",
                self.remote.port,
                MIN_REMOTE_PORT
            );
        }

        self.to_ruleset().context("Invalid bindings")?;

        Ok(())
    }

    /// Default rule set with the saved bindings applied
    pub fn to_ruleset(&self) -> Result<RuleSet, crate::error::MappingError> {
        let mut rules = RuleSet::default();
        rules.apply_records(&self.bindings)?;
        Ok(rules)
    }

    /// Replace the saved bindings with the current rule set
    pub fn store_bindings(&mut self, rules: &RuleSet) {
        self.bindings = rules.records();
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.gamepad.reconnect_interval_ms)
    }
}

// Default value functions
fn default_poll_interval() -> u64 { 20 }
fn default_deadzone() -> i32 { XINPUT_STICK_DEADZONE }
fn default_reconnect_interval() -> u64 { 2000 }
fn default_remote_port() -> u16 { DEFAULT_REMOTE_PORT }
fn default_bindings() -> Vec<BindingRecord> { RuleSet::default().records() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::gamepad::AxisChannel;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("remote:\n  enabled: true\n").unwrap();
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.gamepad.deadzone, 8000);
        assert_eq!(config.gamepad.reconnect_interval_ms, 2000);
        assert!(config.remote.enabled);
        assert_eq!(config.remote.port, 8080);
        assert_eq!(config.to_ruleset().unwrap(), RuleSet::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_bindings_applied_over_defaults() {
        let yaml = r#"
bindings:
  - name: Stop
    button: 9
  - name: SeekForward Axis
    axis: Rz
    threshold: 200
    trigger_above: true
  - name: Volume Up (POV)
    pov: -1
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let rules = config.to_ruleset().unwrap();

        let label = |name: &str| rules.entry(rules.find(name).unwrap()).unwrap().binding_label();
        assert_eq!(label("Stop"), "button 9");
        assert_eq!(label("SeekForward Axis"), format!("axis {} > 200", AxisChannel::Rz));
        assert_eq!(label("Volume Up (POV)"), "(unbound)");
        // Not listed, default kept
        assert_eq!(label("Play Pause"), "button 0");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.remote.port = 80;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gamepad.deadzone = 40000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.bindings.push(BindingRecord {
            name: "Eject".to_string(),
            button: 3,
            axis: None,
            pov: -1,
            threshold: None,
            trigger_above: None,
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("Eject"));
    }

    #[tokio::test]
    async fn test_save_and_reload() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        let path = path.to_string_lossy().to_string();

        let mut rules = RuleSet::default();
        let stop = rules.find("Stop").unwrap();
        rules.bind_button(stop, 0)?;

        let mut config = AppConfig::default();
        config.remote.enabled = true;
        config.remote.port = 9090;
        config.store_bindings(&rules);
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.to_ruleset()?, rules);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "remote:\n  port: 22\n")?;

        assert!(AppConfig::load(&path.to_string_lossy()).await.is_err());
        Ok(())
    }
}
