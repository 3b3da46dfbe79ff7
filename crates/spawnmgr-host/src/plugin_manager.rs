//! Plugin manager: loads, enables, and dispatches events to plugins.

use std::collections::BTreeMap;
use std::path::PathBuf;

use spawnmgr_plugin_api::{
    CommandSender, EventResult, LogLevel, Plugin, PluginEvent, ServerApi, TeleportTarget,
};
use tracing::{debug, error, info, warn};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A scheduled task owned by a plugin.
#[derive(Debug)]
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
}

/// Host state plugins can read during a callback.
pub struct ServerSnapshot {
    pub plugins_dir: PathBuf,
}

/// Deferred side-effect requested by a plugin during a callback.
#[derive(Debug)]
pub enum PendingAction {
    SendMessage {
        player_name: String,
        message: String,
    },
    TeleportPlayer {
        player_name: String,
        target: TeleportTarget,
    },
    RegisterCommand {
        name: String,
        description: String,
        plugin_name: String,
    },
    ScheduleTask {
        task: ScheduledTask,
    },
    CancelTask {
        plugin_name: String,
        task_id: u32,
    },
}

/// A command a plugin registered.
pub struct PluginCommand {
    pub plugin_name: String,
    pub description: String,
}

// ─── ServerApiImpl ───────────────────────────────────────────────────────────

/// Implements `ServerApi` using a snapshot for reads and accumulating PendingActions for writes.
struct ServerApiImpl<'a> {
    snapshot: &'a ServerSnapshot,
    actions: Vec<PendingAction>,
}

impl<'a> ServerApiImpl<'a> {
    fn new(snapshot: &'a ServerSnapshot) -> Self {
        Self {
            snapshot,
            actions: Vec::new(),
        }
    }

    fn take_actions(self) -> Vec<PendingAction> {
        self.actions
    }
}

impl ServerApi for ServerApiImpl<'_> {
    fn send_message(&mut self, player_name: &str, message: &str) {
        self.actions.push(PendingAction::SendMessage {
            player_name: player_name.to_string(),
            message: message.to_string(),
        });
    }

    fn teleport_player(&mut self, player_name: &str, target: &TeleportTarget) {
        self.actions.push(PendingAction::TeleportPlayer {
            player_name: player_name.to_string(),
            target: target.clone(),
        });
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!("[plugin] {message}"),
            LogLevel::Warn => warn!("[plugin] {message}"),
            LogLevel::Error => error!("[plugin] {message}"),
            LogLevel::Debug => debug!("[plugin] {message}"),
        }
    }

    fn plugin_data_dir(&self, plugin_name: &str) -> PathBuf {
        self.snapshot.plugins_dir.join(plugin_name)
    }

    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.actions.push(PendingAction::ScheduleTask {
            task: ScheduledTask {
                plugin_name: plugin_name.to_string(),
                task_id,
                remaining_ticks: delay_ticks,
            },
        });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.actions.push(PendingAction::CancelTask {
            plugin_name: plugin_name.to_string(),
            task_id,
        });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.actions.push(PendingAction::RegisterCommand {
            name: name.to_string(),
            description: description.to_string(),
            plugin_name: plugin_name.to_string(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Manages all loaded plugins, their scheduled tasks, and command registrations.
///
/// Every entry point applies the scheduler and command actions itself and
/// hands back only the ones that touch players.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    /// Commands registered by plugins, keyed by lowercased name.
    commands: BTreeMap<String, PluginCommand>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            tasks: Vec::new(),
            commands: BTreeMap::new(),
        }
    }

    /// Register a plugin (call before enable_all).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        info!("Registered plugin: {}", plugin.info().name);
        self.plugins.push(plugin);
    }

    /// Enable all registered plugins.
    pub fn enable_all(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            plugin.on_enable(&mut api);
            all_actions.extend(api.take_actions());
        }
        self.apply_internal_actions(all_actions)
    }

    /// Disable all registered plugins and drop their pending tasks.
    pub fn disable_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_disable();
        }
        self.tasks.clear();
    }

    /// Dispatch an event to all plugins. Returns the combined result and pending actions.
    pub fn dispatch(
        &mut self,
        event: &PluginEvent,
        snapshot: &ServerSnapshot,
    ) -> (EventResult, Vec<PendingAction>) {
        let cancellable = event.is_cancellable();
        let mut all_actions = Vec::new();
        let mut final_result = EventResult::Continue;

        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            let result = plugin.on_event(event, &mut api);
            all_actions.extend(api.take_actions());

            if cancellable && result == EventResult::Cancelled {
                final_result = EventResult::Cancelled;
                break; // Stop propagation
            }
        }

        (final_result, self.apply_internal_actions(all_actions))
    }

    /// Tick the scheduler. Returns pending actions from fired tasks.
    pub fn tick_scheduler(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        let mut fired: Vec<(String, u32)> = Vec::new();

        for task in &mut self.tasks {
            task.remaining_ticks = task.remaining_ticks.saturating_sub(1);
            if task.remaining_ticks == 0 {
                fired.push((task.plugin_name.clone(), task.task_id));
            }
        }
        self.tasks.retain(|t| t.remaining_ticks > 0);

        for (plugin_name, task_id) in fired {
            if let Some(plugin) = self
                .plugins
                .iter_mut()
                .find(|p| p.info().name == plugin_name)
            {
                let mut api = ServerApiImpl::new(snapshot);
                plugin.on_task(task_id, &mut api);
                all_actions.extend(api.take_actions());
            }
        }

        self.apply_internal_actions(all_actions)
    }

    /// Handle a plugin-registered command. Returns whether a plugin handled it, plus pending actions.
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        snapshot: &ServerSnapshot,
    ) -> (bool, Vec<PendingAction>) {
        let Some(plugin) = self.plugin_for(command) else {
            return (false, Vec::new());
        };

        let mut api = ServerApiImpl::new(snapshot);
        let handled = plugin.on_command(command, args, sender, &mut api);
        let actions = api.take_actions();
        (handled, self.apply_internal_actions(actions))
    }

    /// Completion candidates for a plugin command.
    pub fn tab_complete(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
    ) -> Vec<String> {
        match self.plugin_for(command) {
            Some(plugin) => plugin.on_tab_complete(command, args, sender),
            None => Vec::new(),
        }
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.contains_key(&command.to_lowercase())
    }

    /// Registered commands, sorted by name.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &PluginCommand)> {
        self.commands.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    #[cfg(test)]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    fn plugin_for(&mut self, command: &str) -> Option<&mut Box<dyn Plugin>> {
        let plugin_name = &self.commands.get(&command.to_lowercase())?.plugin_name;
        self.plugins
            .iter_mut()
            .find(|p| &p.info().name == plugin_name)
    }

    /// Load configs for all plugins from `<plugins_dir>/<name>/config.json`.
    ///
    /// A missing file is created from the plugin's default config.
    pub fn load_configs(&mut self, snapshot: &ServerSnapshot) {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            if let Some(default_config) = plugin.default_config() {
                let plugin_dir = snapshot.plugins_dir.join(&info.name);
                let config_path = plugin_dir.join("config.json");

                let config = if config_path.exists() {
                    match std::fs::read_to_string(&config_path) {
                        Ok(data) => match serde_json::from_str(&data) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!("Failed to parse config for {}: {e}", info.name);
                                default_config.clone()
                            }
                        },
                        Err(e) => {
                            warn!("Failed to read config for {}: {e}", info.name);
                            default_config.clone()
                        }
                    }
                } else {
                    if let Err(e) = std::fs::create_dir_all(&plugin_dir) {
                        warn!("Failed to create {}: {e}", plugin_dir.display());
                    }
                    match serde_json::to_string_pretty(&default_config) {
                        Ok(json) => {
                            if let Err(e) = std::fs::write(&config_path, json) {
                                warn!("Failed to write default config for {}: {e}", info.name);
                            }
                        }
                        Err(e) => warn!("Failed to serialize config for {}: {e}", info.name),
                    }
                    default_config
                };

                plugin.load_config(config);
            }
        }
    }

    /// Apply internal actions (RegisterCommand, ScheduleTask, CancelTask) immediately.
    ///
    /// Returns the actions that must be applied to players, in order.
    fn apply_internal_actions(&mut self, actions: Vec<PendingAction>) -> Vec<PendingAction> {
        let mut external = Vec::new();
        for action in actions {
            match action {
                PendingAction::RegisterCommand {
                    name,
                    description,
                    plugin_name,
                } => {
                    debug!("{plugin_name} registered /{name}");
                    self.commands.insert(
                        name.to_lowercase(),
                        PluginCommand {
                            plugin_name,
                            description,
                        },
                    );
                }
                PendingAction::ScheduleTask { task } => {
                    self.tasks.push(task);
                }
                PendingAction::CancelTask {
                    plugin_name,
                    task_id,
                } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == plugin_name && t.task_id == task_id));
                }
                other => external.push(other),
            }
        }
        external
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
