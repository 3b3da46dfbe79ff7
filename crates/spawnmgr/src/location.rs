//! A named, persistable position.

use spawnmgr_plugin_api::{ServerApi, TeleportTarget};

/// A named location. Only entries with a position are "set" and get saved.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntry {
    pub name: String,
    pub position: Option<TeleportTarget>,
}

impl LocationEntry {
    pub fn new(name: impl Into<String>, position: TeleportTarget) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
        }
    }

    /// An entry that exists but has no position yet.
    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.position.is_some()
    }

    /// Ask the host to move `player_name` here. Returns false if unset.
    pub fn teleport(&self, player_name: &str, api: &mut dyn ServerApi) -> bool {
        match &self.position {
            Some(target) => {
                api.teleport_player(player_name, target);
                true
            }
            None => false,
        }
    }
}
