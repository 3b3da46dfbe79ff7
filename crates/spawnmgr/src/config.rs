use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Plugin configuration, stored as `plugins/SpawnManager/config.json`.
///
/// `spawn.location` is used on join and `settings.location_spawn` by
/// `/spawn`. They default to the same name but are read independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    #[serde(default)]
    pub spawn: SpawnSection,
    #[serde(default)]
    pub settings: SettingsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSection {
    /// Location players are sent to when they join.
    #[serde(default = "default_location_name")]
    pub location: String,
}

impl Default for SpawnSection {
    fn default() -> Self {
        Self {
            location: default_location_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSection {
    /// Location used by `/spawn`.
    #[serde(default = "default_location_name")]
    pub location_spawn: String,
    /// `/spawn` cooldown in seconds. 0 = disabled.
    #[serde(default = "default_teleport_delay")]
    pub teleport_delay: u64,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            location_spawn: default_location_name(),
            teleport_delay: default_teleport_delay(),
        }
    }
}

fn default_location_name() -> String {
    "spawn".into()
}

fn default_teleport_delay() -> u64 {
    10
}

impl SpawnConfig {
    /// Parse a config value, falling back to defaults if it is malformed.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid SpawnManager config, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn teleport_delay(&self) -> Duration {
        Duration::from_secs(self.settings.teleport_delay)
    }
}
