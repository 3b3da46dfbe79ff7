//! Plugin API: traits, events, and server API for plugin authors.
//!
//! This crate defines the boundary between the host runtime and its plugins.
//! It has no dependency on spawnmgr-host; host-owned objects (players, world
//! positions, permissions) are only visible through the types below.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A position in a host world, including orientation.
///
/// This is also the on-disk record format for saved locations, so unknown
/// keys are ignored and the rotation defaults to zero when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportTarget {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl TeleportTarget {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

impl fmt::Display for TeleportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.1}, {:.1}, {:.1})",
            self.world, self.x, self.y, self.z
        )
    }
}

/// Read access to a player owned by the host.
pub trait PlayerRef {
    /// Stable identifier, unchanged across sessions.
    fn uuid(&self) -> &str;
    fn name(&self) -> &str;
    /// Operators are privileged callers (they also hold every permission).
    fn is_op(&self) -> bool;
    fn has_permission(&self, node: &str) -> bool;
    /// Current position of the player.
    fn location(&self) -> TeleportTarget;
}

/// Snapshot of an online player, passed to plugins in events and commands.
#[derive(Debug, Clone)]
pub struct PluginPlayer {
    pub name: String,
    pub uuid: String,
    pub location: TeleportTarget,
    pub op: bool,
    /// Permission nodes explicitly granted by the host.
    pub permissions: HashSet<String>,
}

impl PlayerRef for PluginPlayer {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_op(&self) -> bool {
        self.op
    }

    fn has_permission(&self, node: &str) -> bool {
        self.op || self.permissions.contains(node)
    }

    fn location(&self) -> TeleportTarget {
        self.location.clone()
    }
}

/// Whoever issued a command.
#[derive(Debug, Clone)]
pub enum CommandSender {
    /// The server console. Holds every permission but has no position.
    Console,
    Player(PluginPlayer),
}

impl CommandSender {
    pub const CONSOLE_NAME: &'static str = "CONSOLE";

    pub fn name(&self) -> &str {
        match self {
            CommandSender::Console => Self::CONSOLE_NAME,
            CommandSender::Player(p) => &p.name,
        }
    }

    pub fn has_permission(&self, node: &str) -> bool {
        match self {
            CommandSender::Console => true,
            CommandSender::Player(p) => p.has_permission(node),
        }
    }

    /// The sender as an interactive actor, if it is one.
    pub fn as_player(&self) -> Option<&PluginPlayer> {
        match self {
            CommandSender::Console => None,
            CommandSender::Player(p) => Some(p),
        }
    }
}

/// Log level for plugin logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// Result of dispatching an event to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue normal handling.
    Continue,
    /// Event was cancelled by this plugin.
    Cancelled,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// All events that plugins can listen to.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    PlayerJoin {
        player: PluginPlayer,
    },
    PlayerQuit {
        player: PluginPlayer,
    },
    PlayerCommand {
        player: PluginPlayer,
        command: String,
        args: Vec<String>,
    },
    ServerStarted,
    ServerStopping,
}

impl PluginEvent {
    /// Whether this event type can be cancelled by a plugin.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, PluginEvent::PlayerCommand { .. })
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// The Plugin trait, implemented by every plugin the host loads.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to register commands, schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded.
    fn on_disable(&mut self) {}

    /// Called for every dispatched event. Return `Cancelled` to cancel cancellable events.
    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        let _ = (event, api);
        EventResult::Continue
    }

    /// Called when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Called when a plugin-registered command is executed.
    ///
    /// Feedback goes to the sender through `api`. Returns `true` if the
    /// command was handled; the host reports "unknown command" otherwise.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> bool {
        let _ = (command, args, sender, api);
        false
    }

    /// Completion candidates for the argument currently being typed (the last
    /// element of `args`).
    fn on_tab_complete(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
    ) -> Vec<String> {
        let _ = (command, args, sender);
        Vec::new()
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config (from `plugins/<name>/config.json`).
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Access to the host, passed to plugins during callbacks.
///
/// Read methods return data immediately. Write methods are deferred (applied
/// after the plugin callback returns).
pub trait ServerApi {
    // --- Players ---
    fn send_message(&mut self, player_name: &str, message: &str);
    fn teleport_player(&mut self, player_name: &str, target: &TeleportTarget);

    // --- Server ---
    fn log(&self, level: LogLevel, message: &str);
    /// Directory the plugin may keep its files in.
    fn plugin_data_dir(&self, plugin_name: &str) -> PathBuf;

    // --- Scheduler ---
    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32);
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
