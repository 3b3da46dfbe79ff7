use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_name")]
    pub name: String,
    /// Plugin data and config directories live under here.
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: PathBuf,
    /// Directory holding ops.json and permissions.json.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Scheduler tick length in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_name() -> String {
    "spawn-manager dev host".into()
}

fn default_plugins_dir() -> PathBuf {
    PathBuf::from("plugins")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_tick_ms() -> u64 {
    50
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            plugins_dir: default_plugins_dir(),
            data_dir: default_data_dir(),
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_world_name")]
    pub name: String,
    /// Where simulated players appear when they join.
    #[serde(default = "default_spawn")]
    pub spawn: [f64; 3],
}

fn default_world_name() -> String {
    "overworld".into()
}

fn default_spawn() -> [f64; 3] {
    [0.5, 64.0, 0.5]
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            spawn: default_spawn(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl HostConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load `path`, or use defaults if it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
