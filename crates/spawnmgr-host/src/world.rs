//! Simulated online players for the dev host.

use std::collections::BTreeMap;

use spawnmgr_plugin_api::{PluginPlayer, TeleportTarget};
use uuid::Uuid;

use crate::permissions::PermissionManager;

struct OnlinePlayer {
    uuid: String,
    location: TeleportTarget,
}

/// The players currently connected, keyed by display name.
pub struct HostWorld {
    spawn: TeleportTarget,
    players: BTreeMap<String, OnlinePlayer>,
}

impl HostWorld {
    /// `spawn` is where players appear when they join.
    pub fn new(spawn: TeleportTarget) -> Self {
        Self {
            spawn,
            players: BTreeMap::new(),
        }
    }

    /// Returns false if `name` is already online.
    pub fn join(&mut self, name: &str) -> bool {
        if self.players.contains_key(name) {
            return false;
        }
        self.players.insert(
            name.to_string(),
            OnlinePlayer {
                uuid: offline_uuid(name),
                location: self.spawn.clone(),
            },
        );
        true
    }

    pub fn quit(&mut self, name: &str) -> bool {
        self.players.remove(name).is_some()
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    /// Move a player. Returns false if they are not online.
    pub fn teleport(&mut self, name: &str, target: &TeleportTarget) -> bool {
        match self.players.get_mut(name) {
            Some(player) => {
                player.location = target.clone();
                true
            }
            None => false,
        }
    }

    pub fn location(&self, name: &str) -> Option<&TeleportTarget> {
        self.players.get(name).map(|p| &p.location)
    }

    /// Online names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    /// Build the plugin-facing view of an online player.
    pub fn plugin_player(&self, name: &str, perms: &PermissionManager) -> Option<PluginPlayer> {
        let player = self.players.get(name)?;
        Some(PluginPlayer {
            name: name.to_string(),
            uuid: player.uuid.clone(),
            location: player.location.clone(),
            op: perms.is_op(name),
            permissions: perms.nodes_for(name),
        })
    }
}

/// Name-based (v5) identifier, so a returning player keeps the same uuid.
fn offline_uuid(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.to_lowercase().as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> HostWorld {
        HostWorld::new(TeleportTarget::new("overworld", 0.5, 64.0, 0.5))
    }

    #[test]
    fn join_places_player_at_spawn() {
        let mut w = world();
        assert!(w.join("Alice"));
        assert!(!w.join("Alice"));
        assert_eq!(w.location("Alice").unwrap().y, 64.0);
        assert_eq!(w.names(), vec!["Alice"]);
    }

    #[test]
    fn quit_removes_player() {
        let mut w = world();
        w.join("Alice");
        assert!(w.quit("Alice"));
        assert!(!w.quit("Alice"));
        assert!(!w.is_online("Alice"));
    }

    #[test]
    fn teleport_requires_online_player() {
        let mut w = world();
        let target = TeleportTarget::new("nether", 1.0, 2.0, 3.0);
        assert!(!w.teleport("Bob", &target));
        w.join("Bob");
        assert!(w.teleport("Bob", &target));
        assert_eq!(w.location("Bob"), Some(&target));
    }

    #[test]
    fn uuid_is_stable_across_sessions() {
        let mut w = world();
        w.join("Alice");
        let perms = PermissionManager::load(std::env::temp_dir().join("spawnmgr_world_unused"));
        let first = w.plugin_player("Alice", &perms).unwrap().uuid;
        w.quit("Alice");
        w.join("Alice");
        let second = w.plugin_player("Alice", &perms).unwrap().uuid;
        assert_eq!(first, second);
        assert_eq!(first.len(), 36);
        assert_ne!(first, offline_uuid("Bob"));
        assert_eq!(first, offline_uuid("ALICE"));

        let parsed = Uuid::parse_str(&first).unwrap();
        assert_eq!(parsed.get_version_num(), 5);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn plugin_player_carries_permissions() {
        let mut w = world();
        w.join("Alice");
        let mut perms =
            PermissionManager::load(std::env::temp_dir().join("spawnmgr_world_unused"));
        perms.grant("Alice", "spawnmanager.location.use");
        let p = w.plugin_player("Alice", &perms).unwrap();
        assert!(!p.op);
        assert!(p.permissions.contains("spawnmanager.location.use"));
        assert!(w.plugin_player("Bob", &perms).is_none());
    }
}
