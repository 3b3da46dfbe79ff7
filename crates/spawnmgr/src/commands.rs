//! `/spawn` and `/location` command handling.
//!
//! Handlers return `Result<CommandResult, CommandError>`; errors are turned
//! into a failed result carrying their message, so nothing escapes to the
//! host. For each subcommand, checks run in a fixed order: base permission,
//! player-only, subcommand permission, argument count, then existence.

use spawnmgr_command::{CommandContext, CommandResult};
use spawnmgr_plugin_api::{CommandSender, PlayerRef, PluginPlayer, ServerApi};
use thiserror::Error;
use tracing::info;

use crate::error::LocationError;
use crate::location::LocationEntry;
use crate::plugin::SpawnManager;

/// Permission nodes.
pub mod perm {
    pub const LOCATION_USE: &str = "spawnmanager.location.use";
    pub const LOCATION_CREATE: &str = "spawnmanager.location.create";
    pub const LOCATION_SET: &str = "spawnmanager.location.set";
    pub const LOCATION_DELETE: &str = "spawnmanager.location.delete";
    pub const LOCATION_TELEPORT: &str = "spawnmanager.location.teleport";
    pub const LOCATION_LIST: &str = "spawnmanager.location.list";
    pub const ADMIN_USE: &str = "spawnmanager.admin.use";
    pub const ADMIN_SAVE: &str = "spawnmanager.admin.save";
    pub const ADMIN_LOAD: &str = "spawnmanager.admin.load";
}

/// A command that could not be carried out. `Display` is the text shown to
/// the sender.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("You don't have permission to {0}.")]
    PermissionDenied(&'static str),

    #[error("Only a player can use this command.")]
    PlayerOnly,

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("No location named '{0}'.")]
    NotFound(String),

    #[error("A location named '{0}' already exists.")]
    AlreadyExists(String),

    #[error("The spawn location is not set.")]
    SpawnUnset,

    #[error("Please wait {seconds} second(s) before using /spawn again.")]
    OnCooldown { seconds: u64 },

    #[error("Unknown subcommand. Use /location help for a list of commands.")]
    UnknownSubcommand,

    #[error("Unknown admin subcommand. Use: save, load")]
    UnknownAdminSubcommand,

    #[error("{0}")]
    Location(#[from] LocationError),
}

type CommandOutcome = Result<CommandResult, CommandError>;

fn require(sender: &CommandSender, node: &str, action: &'static str) -> Result<(), CommandError> {
    if sender.has_permission(node) {
        Ok(())
    } else {
        Err(CommandError::PermissionDenied(action))
    }
}

fn require_player(sender: &CommandSender) -> Result<&PluginPlayer, CommandError> {
    sender.as_player().ok_or(CommandError::PlayerOnly)
}

fn name_arg<'a>(ctx: &'a CommandContext, usage: &'static str) -> Result<&'a str, CommandError> {
    ctx.arg(1).ok_or(CommandError::Usage(usage))
}

impl SpawnManager {
    /// Run `command`. Returns `None` for commands this plugin does not own.
    pub(crate) fn run_command(
        &mut self,
        command: &str,
        ctx: &CommandContext,
        api: &mut dyn ServerApi,
    ) -> Option<CommandResult> {
        let outcome = match command.to_lowercase().as_str() {
            "spawn" => self.cmd_spawn(ctx, api),
            "location" => self.cmd_location(ctx, api),
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|e| CommandResult::err(e.to_string())))
    }

    fn cmd_spawn(&mut self, ctx: &CommandContext, api: &mut dyn ServerApi) -> CommandOutcome {
        let player = require_player(&ctx.sender)?;

        if self.cooldowns.is_active(player) {
            let remaining = self.cooldowns.remaining(player.uuid());
            return Err(CommandError::OnCooldown {
                seconds: remaining.as_secs() + 1,
            });
        }

        let entry = self
            .locations
            .get(&self.config.settings.location_spawn)
            .filter(|e| e.is_set())
            .ok_or(CommandError::SpawnUnset)?;
        entry.teleport(&player.name, api);

        self.start_cooldown(player.uuid(), api);
        Ok(CommandResult::ok("Teleporting to spawn..."))
    }

    fn cmd_location(&mut self, ctx: &CommandContext, api: &mut dyn ServerApi) -> CommandOutcome {
        require(&ctx.sender, perm::LOCATION_USE, "use this command")?;

        let Some(sub) = ctx.subcommand() else {
            return Ok(self.help());
        };
        match sub.as_str() {
            "help" => Ok(self.help()),
            "create" => self.cmd_create(ctx),
            "set" => self.cmd_set(ctx),
            "delete" => self.cmd_delete(ctx),
            "teleport" => self.cmd_teleport(ctx, api),
            "list" => self.cmd_list(ctx),
            "admin" => self.cmd_admin(ctx),
            _ => Err(CommandError::UnknownSubcommand),
        }
    }

    fn cmd_create(&mut self, ctx: &CommandContext) -> CommandOutcome {
        let player = require_player(&ctx.sender)?;
        require(&ctx.sender, perm::LOCATION_CREATE, "create locations")?;
        let name = name_arg(ctx, "/location create <name>")?;

        if self.locations.contains(name) {
            return Err(CommandError::AlreadyExists(name.to_string()));
        }
        self.locations
            .register(LocationEntry::new(name, player.location()))?;
        info!("{} created location '{name}'", player.name);
        Ok(CommandResult::ok(format!(
            "Location '{name}' created at your position."
        )))
    }

    fn cmd_set(&mut self, ctx: &CommandContext) -> CommandOutcome {
        let player = require_player(&ctx.sender)?;
        require(&ctx.sender, perm::LOCATION_SET, "modify locations")?;
        let name = name_arg(ctx, "/location set <name>")?;

        if !self.locations.contains(name) {
            return Err(CommandError::NotFound(name.to_string()));
        }
        self.locations.set_position(name, player.location())?;
        info!("{} moved location '{name}'", player.name);
        Ok(CommandResult::ok(format!(
            "Location '{name}' updated to your position."
        )))
    }

    fn cmd_delete(&mut self, ctx: &CommandContext) -> CommandOutcome {
        require(&ctx.sender, perm::LOCATION_DELETE, "delete locations")?;
        let name = name_arg(ctx, "/location delete <name>")?;

        self.locations
            .unregister(name)
            .ok_or_else(|| CommandError::NotFound(name.to_string()))?;
        info!("{} deleted location '{name}'", ctx.sender.name());
        Ok(CommandResult::ok(format!("Location '{name}' deleted.")))
    }

    fn cmd_teleport(&mut self, ctx: &CommandContext, api: &mut dyn ServerApi) -> CommandOutcome {
        let player = require_player(&ctx.sender)?;
        require(&ctx.sender, perm::LOCATION_TELEPORT, "teleport")?;
        let name = name_arg(ctx, "/location teleport <name>")?;

        let entry = self
            .locations
            .get(name)
            .filter(|e| e.is_set())
            .ok_or_else(|| CommandError::NotFound(name.to_string()))?;
        entry.teleport(&player.name, api);
        Ok(CommandResult::ok(format!("Teleporting to '{name}'.")))
    }

    fn cmd_list(&mut self, ctx: &CommandContext) -> CommandOutcome {
        require(&ctx.sender, perm::LOCATION_LIST, "list locations")?;

        let names = self.locations.names();
        if names.is_empty() {
            return Ok(CommandResult::ok("No locations registered."));
        }
        let mut lines = Vec::with_capacity(names.len() + 1);
        lines.push("Available locations:".to_string());
        lines.extend(names.into_iter().map(|n| format!("- {n}")));
        Ok(CommandResult::lines(true, lines))
    }

    fn cmd_admin(&mut self, ctx: &CommandContext) -> CommandOutcome {
        require(&ctx.sender, perm::ADMIN_USE, "use admin commands")?;
        let action = ctx
            .arg(1)
            .ok_or(CommandError::Usage("/location admin <save|load>"))?;

        match action.to_lowercase().as_str() {
            "save" => {
                require(&ctx.sender, perm::ADMIN_SAVE, "save locations")?;
                let count = self.save_locations()?;
                Ok(CommandResult::ok(format!("Saved {count} location(s).")))
            }
            "load" => {
                require(&ctx.sender, perm::ADMIN_LOAD, "load locations")?;
                let count = self.load_locations()?;
                Ok(CommandResult::ok(format!("Loaded {count} location(s).")))
            }
            _ => Err(CommandError::UnknownAdminSubcommand),
        }
    }

    fn help(&self) -> CommandResult {
        let delay = self.config.settings.teleport_delay;
        let lines = [
            "Commands:".to_string(),
            "/location create <name> - Create a location at your position.".to_string(),
            "/location set <name> - Move an existing location to your position.".to_string(),
            "/location delete <name> - Delete a location.".to_string(),
            "/location teleport <name> - Teleport to a location.".to_string(),
            "/location list - List all locations.".to_string(),
            "/location admin save - Save locations to disk.".to_string(),
            "/location admin load - Reload locations from disk.".to_string(),
            format!("/spawn - Teleport to the spawn (cooldown {delay} sec)."),
        ];
        CommandResult::lines(true, Vec::from(lines))
    }
}
