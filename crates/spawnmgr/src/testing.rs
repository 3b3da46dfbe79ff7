//! Shared test fixtures.

use std::collections::HashSet;
use std::path::PathBuf;

use spawnmgr_plugin_api::{LogLevel, PluginPlayer, ServerApi, TeleportTarget};

/// Records every call a plugin makes into the host.
pub struct MockApi {
    pub data_root: PathBuf,
    pub messages: Vec<(String, String)>,
    pub teleports: Vec<(String, TeleportTarget)>,
    pub scheduled: Vec<(u64, u32)>,
    pub cancelled: Vec<u32>,
    pub commands: Vec<String>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::with_data_root(std::env::temp_dir().join("spawnmgr_unused"))
    }

    pub fn with_data_root(data_root: PathBuf) -> Self {
        Self {
            data_root,
            messages: Vec::new(),
            teleports: Vec::new(),
            scheduled: Vec::new(),
            cancelled: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Messages sent to `name`, in order.
    pub fn messages_to(&self, name: &str) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(to, _)| to == name)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

impl ServerApi for MockApi {
    fn send_message(&mut self, player_name: &str, message: &str) {
        self.messages
            .push((player_name.to_string(), message.to_string()));
    }
    fn teleport_player(&mut self, player_name: &str, target: &TeleportTarget) {
        self.teleports
            .push((player_name.to_string(), target.clone()));
    }
    fn log(&self, _level: LogLevel, _message: &str) {}
    fn plugin_data_dir(&self, plugin_name: &str) -> PathBuf {
        self.data_root.join(plugin_name)
    }
    fn schedule_delayed(&mut self, _plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.scheduled.push((delay_ticks, task_id));
    }
    fn cancel_task(&mut self, _plugin_name: &str, task_id: u32) {
        self.cancelled.push(task_id);
    }
    fn register_command(&mut self, name: &str, _description: &str, _plugin_name: &str) {
        self.commands.push(name.to_string());
    }
}

/// A non-op player with no permissions standing at the origin.
pub fn player(name: &str) -> PluginPlayer {
    PluginPlayer {
        name: name.to_string(),
        uuid: format!("uuid-{name}"),
        location: TeleportTarget::new("overworld", 0.0, 64.0, 0.0),
        op: false,
        permissions: HashSet::new(),
    }
}

/// A player holding the given `spawnmanager.*` nodes (without the prefix).
pub fn player_with(name: &str, nodes: &[&str]) -> PluginPlayer {
    let mut p = player(name);
    p.permissions = nodes
        .iter()
        .map(|n| format!("spawnmanager.{n}"))
        .collect();
    p
}

/// A fresh, empty directory unique to this test process and `tag`.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spawnmgr_{tag}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
