//! Overlay configuration file
//!
//! JSON envelope holding the user settings and physics tuning. A missing
//! file yields defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::{Preset, Settings};
use crate::sim::PhysicsParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Preset applied on top of `settings` at load, if any
    pub preset: Option<String>,
    pub settings: Settings,
    pub physics: PhysicsParams,
}

impl OverlayConfig {
    /// Load from a JSON file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a config; out-of-range physics values are corrected, not rejected
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.physics = config.physics.sanitized();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Settings with the named preset (if any) applied
    pub fn effective_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = self.settings;
        if let Some(name) = &self.preset {
            let preset = Preset::from_str(name)
                .ok_or_else(|| crate::SettingsError::UnknownPreset(name.clone()))?;
            settings.apply_preset(preset);
        }
        Ok(settings.sanitized())
    }
}
