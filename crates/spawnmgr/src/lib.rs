//! SpawnManager: named locations, a cooldown-gated `/spawn`, and join-time
//! spawn teleport, written against `spawnmgr-plugin-api`.
//!
//! The plugin owns a [`LocationRegistry`] and a [`CooldownTracker`] and is
//! driven entirely by host callbacks (see [`SpawnManager`]).

pub mod commands;
pub mod completion;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod location;
pub mod plugin;
pub mod registry;
pub mod storage;

#[cfg(test)]
mod testing;

pub use commands::CommandError;
pub use config::SpawnConfig;
pub use cooldown::{Clock, CooldownTracker, ManualClock, SystemClock};
pub use error::LocationError;
pub use location::LocationEntry;
pub use plugin::{SpawnManager, PLUGIN_NAME};
pub use registry::LocationRegistry;
