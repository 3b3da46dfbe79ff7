//! Host state and the interactive console.
//!
//! Console lines are either built-in host commands (player simulation,
//! permissions) or plugin commands, which run with the console as sender.

use spawnmgr_command::{
    complete_prefix, split_command_line, CommandContext, CommandRegistry, CommandResult,
};
use spawnmgr_plugin_api::{CommandSender, EventResult, PluginEvent, TeleportTarget};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::permissions::PermissionManager;
use crate::plugin_manager::{PendingAction, PluginManager, ServerSnapshot};
use crate::world::HostWorld;

/// Everything a console command can touch.
pub struct Host {
    pub world: HostWorld,
    pub permissions: PermissionManager,
    pub plugins: PluginManager,
    snapshot: ServerSnapshot,
    default_world: String,
}

impl Host {
    pub fn new(config: &HostConfig) -> Self {
        let [x, y, z] = config.world.spawn;
        Self {
            world: HostWorld::new(TeleportTarget::new(&config.world.name, x, y, z)),
            permissions: PermissionManager::load(&config.server.data_dir),
            plugins: PluginManager::new(),
            snapshot: ServerSnapshot {
                plugins_dir: config.server.plugins_dir.clone(),
            },
            default_world: config.world.name.clone(),
        }
    }

    /// Load plugin configs and enable every registered plugin.
    pub fn start(&mut self) -> Vec<String> {
        self.plugins.load_configs(&self.snapshot);
        let mut lines = {
            let actions = self.plugins.enable_all(&self.snapshot);
            self.apply(actions)
        };
        let (_, actions) = self.plugins.dispatch(&PluginEvent::ServerStarted, &self.snapshot);
        lines.extend(self.apply(actions));
        lines
    }

    /// Notify plugins, disable them, and persist permissions.
    pub fn shutdown(&mut self) -> Vec<String> {
        let (_, actions) = self.plugins.dispatch(&PluginEvent::ServerStopping, &self.snapshot);
        let lines = self.apply(actions);
        self.plugins.disable_all();
        self.permissions.save_all();
        lines
    }

    /// Advance the plugin scheduler by one tick.
    pub fn tick(&mut self) -> Vec<String> {
        let actions = self.plugins.tick_scheduler(&self.snapshot);
        self.apply(actions)
    }

    pub fn join(&mut self, name: &str) -> Result<Vec<String>, String> {
        if !self.world.join(name) {
            return Err(format!("{name} is already online."));
        }
        info!("{name} joined");
        let Some(player) = self.world.plugin_player(name, &self.permissions) else {
            return Ok(Vec::new());
        };
        let (_, actions) = self
            .plugins
            .dispatch(&PluginEvent::PlayerJoin { player }, &self.snapshot);
        Ok(self.apply(actions))
    }

    pub fn quit(&mut self, name: &str) -> Result<Vec<String>, String> {
        let Some(player) = self.world.plugin_player(name, &self.permissions) else {
            return Err(format!("{name} is not online."));
        };
        let (_, actions) = self
            .plugins
            .dispatch(&PluginEvent::PlayerQuit { player }, &self.snapshot);
        let lines = self.apply(actions);
        self.world.quit(name);
        info!("{name} left");
        Ok(lines)
    }

    /// Run a plugin command. Player commands pass through `PlayerCommand` first.
    pub fn run_plugin_command(
        &mut self,
        sender: &CommandSender,
        command: &str,
        args: &[String],
    ) -> CommandResult {
        if let CommandSender::Player(player) = sender {
            let event = PluginEvent::PlayerCommand {
                player: player.clone(),
                command: command.to_string(),
                args: args.to_vec(),
            };
            let (result, actions) = self.plugins.dispatch(&event, &self.snapshot);
            let mut lines = self.apply(actions);
            if result == EventResult::Cancelled {
                lines.push(format!("/{command} was cancelled by a plugin."));
                return CommandResult::lines(false, lines);
            }
        }

        let (handled, actions) = self
            .plugins
            .handle_command(command, args, sender, &self.snapshot);
        if !handled {
            return CommandResult::err(format!(
                "Unknown command: {command}. Type help for a list of commands."
            ));
        }
        CommandResult::lines(true, self.apply(actions))
    }

    /// Apply player-facing plugin actions. Returns the lines to show on the console.
    fn apply(&mut self, actions: Vec<PendingAction>) -> Vec<String> {
        let mut lines = Vec::new();
        for action in actions {
            match action {
                PendingAction::SendMessage {
                    player_name,
                    message,
                } => {
                    if player_name == CommandSender::CONSOLE_NAME {
                        lines.push(message);
                    } else if self.world.is_online(&player_name) {
                        lines.push(format!("[-> {player_name}] {message}"));
                    } else {
                        debug!("Dropped message for offline player {player_name}");
                    }
                }
                PendingAction::TeleportPlayer {
                    player_name,
                    target,
                } => {
                    if self.world.teleport(&player_name, &target) {
                        info!("Teleported {player_name} to {target}");
                    } else {
                        warn!("Cannot teleport offline player {player_name}");
                    }
                }
                other => debug!("Unapplied plugin action: {other:?}"),
            }
        }
        lines
    }
}

// ─── Console commands ────────────────────────────────────────────────────────

/// Parses console lines and routes them to host or plugin commands.
pub struct Console {
    registry: CommandRegistry<Host>,
}

impl Console {
    pub fn new() -> Self {
        let mut registry = CommandRegistry::new();
        registry.register("join", "Connect a simulated player: join <name>", cmd_join);
        registry.register("quit", "Disconnect a player: quit <name>", cmd_quit);
        registry.register("players", "List online players", cmd_players);
        registry.register("where", "Show a player's position: where <name>", cmd_where);
        registry.register(
            "move",
            "Move a player: move <name> <x> <y> <z> [world]",
            cmd_move,
        );
        registry.register("op", "Make a player an operator: op <name>", cmd_op);
        registry.register("deop", "Remove operator status: deop <name>", cmd_deop);
        registry.register("grant", "Grant a permission: grant <name> <node>", cmd_grant);
        registry.register("revoke", "Revoke a permission: revoke <name> <node>", cmd_revoke);
        registry.register(
            "as",
            "Run a plugin command as a player: as <name> <command> [args]",
            cmd_as,
        );
        registry.register("stop", "Stop the host", cmd_stop);
        Self { registry }
    }

    /// Execute one console line.
    pub fn handle_line(&self, host: &mut Host, line: &str) -> CommandResult {
        let Some((name, args)) = split_command_line(line) else {
            return CommandResult::lines(true, Vec::new());
        };
        match name.to_lowercase().as_str() {
            "help" => CommandResult::lines(true, self.help(host)),
            "complete" => self.complete(host, &args),
            _ if self.registry.contains(&name) => {
                let ctx = CommandContext::new(CommandSender::Console, args);
                self.registry.execute(&name, host, &ctx)
            }
            _ => host.run_plugin_command(&CommandSender::Console, &name, &args),
        }
    }

    fn help(&self, host: &Host) -> Vec<String> {
        let mut lines = vec!["Host commands:".to_string()];
        lines.push("  complete - Tab-complete a command line: complete <command> [args]".into());
        lines.push("  help - Show this list".into());
        lines.extend(self.registry.help_lines());
        lines.push("Plugin commands:".into());
        lines.extend(
            host.plugins
                .commands()
                .map(|(name, cmd)| format!("  {name} - {} ({})", cmd.description, cmd.plugin_name)),
        );
        lines
    }

    /// `complete <command> [args]`. A `""` argument stands for an empty word.
    fn complete(&self, host: &mut Host, args: &[String]) -> CommandResult {
        let words: Vec<String> = args
            .iter()
            .map(|a| if a == "\"\"" { String::new() } else { a.clone() })
            .collect();
        let candidates = match words.as_slice() {
            [] => return CommandResult::err("Usage: complete <command> [args]"),
            [prefix] => {
                let mut names = self.registry.complete(prefix);
                let plugin_names: Vec<&str> = host.plugins.commands().map(|(n, _)| n).collect();
                names.extend(complete_prefix(plugin_names, prefix));
                names.extend(complete_prefix(["complete", "help"], prefix));
                names.sort();
                names
            }
            [command, rest @ ..] => {
                host.plugins
                    .tab_complete(command, rest, &CommandSender::Console)
            }
        };
        if candidates.is_empty() {
            CommandResult::ok("No completions.")
        } else {
            CommandResult::ok(candidates.join(" "))
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn usage(text: &str) -> CommandResult {
    CommandResult::err(format!("Usage: {text}"))
}

fn with_lines(result: Result<Vec<String>, String>, done: String) -> CommandResult {
    match result {
        Ok(mut lines) => {
            lines.insert(0, done);
            CommandResult::lines(true, lines)
        }
        Err(e) => CommandResult::err(e),
    }
}

fn cmd_join(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let Some(name) = ctx.arg(0) else {
        return usage("join <name>");
    };
    with_lines(host.join(name), format!("{name} joined the game."))
}

fn cmd_quit(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let Some(name) = ctx.arg(0) else {
        return usage("quit <name>");
    };
    with_lines(host.quit(name), format!("{name} left the game."))
}

fn cmd_players(host: &mut Host, _ctx: &CommandContext) -> CommandResult {
    let names = host.world.names();
    if names.is_empty() {
        CommandResult::ok("No players online.")
    } else {
        CommandResult::ok(format!("Online ({}): {}", names.len(), names.join(", ")))
    }
}

fn cmd_where(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let Some(name) = ctx.arg(0) else {
        return usage("where <name>");
    };
    match host.world.location(name) {
        Some(location) => CommandResult::ok(format!("{name} is at {location}")),
        None => CommandResult::err(format!("{name} is not online.")),
    }
}

fn cmd_move(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let (Some(name), Some(x), Some(y), Some(z)) = (ctx.arg(0), ctx.arg(1), ctx.arg(2), ctx.arg(3))
    else {
        return usage("move <name> <x> <y> <z> [world]");
    };
    let (Ok(x), Ok(y), Ok(z)) = (x.parse::<f64>(), y.parse::<f64>(), z.parse::<f64>()) else {
        return CommandResult::err("Coordinates must be numbers.");
    };
    let world = ctx.arg(4).unwrap_or(host.default_world.as_str()).to_string();
    let target = TeleportTarget::new(world, x, y, z);
    if host.world.teleport(name, &target) {
        CommandResult::ok(format!("Moved {name} to {target}"))
    } else {
        CommandResult::err(format!("{name} is not online."))
    }
}

fn cmd_op(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let Some(name) = ctx.arg(0) else {
        return usage("op <name>");
    };
    if !host.permissions.op(name) {
        return CommandResult::err(format!("{name} is already an operator."));
    }
    host.permissions.save_ops();
    CommandResult::ok(format!("Made {name} a server operator."))
}

fn cmd_deop(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let Some(name) = ctx.arg(0) else {
        return usage("deop <name>");
    };
    if !host.permissions.deop(name) {
        return CommandResult::err(format!("{name} is not an operator."));
    }
    host.permissions.save_ops();
    CommandResult::ok(format!("Made {name} no longer a server operator."))
}

fn cmd_grant(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let (Some(name), Some(node)) = (ctx.arg(0), ctx.arg(1)) else {
        return usage("grant <name> <node>");
    };
    if !host.permissions.grant(name, node) {
        return CommandResult::err(format!("{name} already has {node}."));
    }
    host.permissions.save_grants();
    CommandResult::ok(format!("Granted {node} to {name}."))
}

fn cmd_revoke(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let (Some(name), Some(node)) = (ctx.arg(0), ctx.arg(1)) else {
        return usage("revoke <name> <node>");
    };
    if !host.permissions.revoke(name, node) {
        return CommandResult::err(format!("{name} does not have {node}."));
    }
    host.permissions.save_grants();
    CommandResult::ok(format!("Revoked {node} from {name}."))
}

fn cmd_as(host: &mut Host, ctx: &CommandContext) -> CommandResult {
    let (Some(name), Some(command)) = (ctx.arg(0), ctx.arg(1)) else {
        return usage("as <name> <command> [args]");
    };
    let command = command.strip_prefix('/').unwrap_or(command);
    if !host.plugins.has_command(command) {
        return CommandResult::err(format!(
            "Unknown command: {command}. Type help for a list of commands."
        ));
    }
    let Some(player) = host.world.plugin_player(name, &host.permissions) else {
        return CommandResult::err(format!("{name} is not online."));
    };
    host.run_plugin_command(&CommandSender::Player(player), command, &ctx.args[2..])
}

fn cmd_stop(_host: &mut Host, _ctx: &CommandContext) -> CommandResult {
    let mut result = CommandResult::ok("Stopping the host...");
    result.should_stop = true;
    result
}

// ─── Tests ───────────────────────────────────────────────────────────────────
