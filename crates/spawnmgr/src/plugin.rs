//! The `SpawnManager` plugin: wires the registry, cooldowns and commands
//! into the host lifecycle.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use spawnmgr_command::CommandContext;
use spawnmgr_plugin_api::{
    CommandSender, EventResult, LogLevel, Plugin, PluginEvent, PluginInfo, PluginPlayer,
    ServerApi,
};
use tracing::{info, warn};

use crate::completion;
use crate::config::SpawnConfig;
use crate::cooldown::{millis, Clock, CooldownTracker, SystemClock};
use crate::error::LocationError;
use crate::registry::LocationRegistry;
use crate::storage::LOCATIONS_FILE;

pub const PLUGIN_NAME: &str = "SpawnManager";

/// Host scheduler resolution.
const MILLIS_PER_TICK: u64 = 50;

/// Convert a delay into scheduler ticks, rounding up so the task never fires early.
fn delay_to_ticks(delay: Duration) -> u64 {
    millis(delay).div_ceil(MILLIS_PER_TICK)
}

pub struct SpawnManager {
    pub(crate) config: SpawnConfig,
    pub(crate) locations: LocationRegistry,
    pub(crate) cooldowns: CooldownTracker,
    clock: Arc<dyn Clock>,
    data_dir: PathBuf,
    /// Pending deferred evictions: task id → player uuid.
    evictions: HashMap<u32, String>,
    next_task_id: u32,
}

impl SpawnManager {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let config = SpawnConfig::default();
        let cooldowns = CooldownTracker::new(config.teleport_delay(), clock.clone());
        Self {
            config,
            locations: LocationRegistry::new(),
            cooldowns,
            clock,
            data_dir: PathBuf::from("plugins").join(PLUGIN_NAME),
            evictions: HashMap::new(),
            next_task_id: 1,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn locations_mut(&mut self) -> &mut LocationRegistry {
        &mut self.locations
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Where the registry is persisted.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(LOCATIONS_FILE)
    }

    pub fn save_locations(&self) -> Result<usize, LocationError> {
        self.locations
            .save(&self.data_file())
            .inspect_err(|e| warn!("Failed to save locations: {e}"))
    }

    pub fn load_locations(&mut self) -> Result<usize, LocationError> {
        let path = self.data_file();
        self.locations
            .load(&path)
            .inspect_err(|e| warn!("Failed to load locations: {e}"))
    }

    fn alloc_task_id(&mut self) -> u32 {
        let id = self.next_task_id;
        self.next_task_id = self.next_task_id.wrapping_add(1);
        id
    }

    /// Start the `/spawn` cooldown and schedule its deferred eviction.
    pub(crate) fn start_cooldown(&mut self, player_id: &str, api: &mut dyn ServerApi) {
        let Some(delay) = self.cooldowns.start(player_id) else {
            return;
        };

        let previous = self
            .evictions
            .iter()
            .find(|(_, id)| id.as_str() == player_id)
            .map(|(&task_id, _)| task_id);
        if let Some(task_id) = previous {
            self.evictions.remove(&task_id);
            api.cancel_task(PLUGIN_NAME, task_id);
        }

        let task_id = self.alloc_task_id();
        self.evictions.insert(task_id, player_id.to_string());
        api.schedule_delayed(PLUGIN_NAME, delay_to_ticks(delay), task_id);
    }

    /// Join-time teleport. Never cooldown-gated.
    fn send_to_spawn_on_join(&self, player: &PluginPlayer, api: &mut dyn ServerApi) {
        let teleported = self
            .locations
            .get(&self.config.spawn.location)
            .is_some_and(|entry| entry.teleport(&player.name, api));
        let message = if teleported {
            "You have been teleported to the spawn."
        } else {
            "The spawn is not set. Please contact an administrator."
        };
        api.send_message(&player.name, message);
    }
}

impl Default for SpawnManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SpawnManager {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Named locations and a /spawn command".into(),
            author: "spawn-manager contributors".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        self.data_dir = api.plugin_data_dir(PLUGIN_NAME);
        api.register_command("spawn", "Teleport to the spawn", PLUGIN_NAME);
        api.register_command("location", "Manage named locations", PLUGIN_NAME);

        // A failed load is already logged; the plugin keeps running with an empty registry.
        let count = self.load_locations().unwrap_or(0);
        api.log(
            LogLevel::Info,
            &format!("{PLUGIN_NAME} enabled with {count} location(s)"),
        );
    }

    fn on_disable(&mut self) {
        if let Ok(count) = self.save_locations() {
            info!("{PLUGIN_NAME} disabled, saved {count} location(s)");
        }
    }

    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        if let PluginEvent::PlayerJoin { player } = event {
            self.send_to_spawn_on_join(player, api);
        }
        EventResult::Continue
    }

    fn on_task(&mut self, task_id: u32, _api: &mut dyn ServerApi) {
        if let Some(player_id) = self.evictions.remove(&task_id) {
            self.cooldowns.evict(&player_id);
        }
    }

    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> bool {
        let ctx = CommandContext::new(sender.clone(), args.to_vec());
        let Some(result) = self.run_command(command, &ctx, api) else {
            return false;
        };
        for line in &result.messages {
            api.send_message(sender.name(), line);
        }
        true
    }

    fn on_tab_complete(
        &mut self,
        command: &str,
        args: &[String],
        _sender: &CommandSender,
    ) -> Vec<String> {
        completion::complete(command, args, &self.locations)
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        Some(SpawnConfig::default().to_value())
    }

    fn load_config(&mut self, config: serde_json::Value) {
        self.config = SpawnConfig::from_value(config);
        self.cooldowns = CooldownTracker::new(self.config.teleport_delay(), self.clock.clone());
        self.evictions.clear();
    }
}
