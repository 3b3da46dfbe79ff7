//! Command parsing, registry, and completion helpers.

use std::collections::BTreeMap;

use spawnmgr_plugin_api::CommandSender;

/// Context passed to a command handler.
pub struct CommandContext {
    /// Who is executing the command.
    pub sender: CommandSender,
    /// Arguments after the command name.
    pub args: Vec<String>,
}

impl CommandContext {
    pub fn new(sender: CommandSender, args: Vec<String>) -> Self {
        Self { sender, args }
    }

    /// Argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// First argument, lowercased. Subcommand names are case-insensitive.
    pub fn subcommand(&self) -> Option<String> {
        self.arg(0).map(str::to_lowercase)
    }
}

/// Result returned by a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to send back to the command sender.
    pub messages: Vec<String>,
    /// If true, the server should shut down.
    pub should_stop: bool,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::lines(true, vec![message.into()])
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self::lines(false, vec![message.into()])
    }

    /// Create a result carrying several lines.
    pub fn lines(success: bool, messages: Vec<String>) -> Self {
        Self {
            success,
            messages,
            should_stop: false,
        }
    }
}

/// Split a raw command line into its name and arguments.
///
/// A leading `/` is stripped. Returns `None` for blank input.
pub fn split_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_string();
    Some((name, parts.map(String::from).collect()))
}

/// Keep the candidates that start with `prefix`, ignoring case.
///
/// Candidates keep their original casing and order.
pub fn complete_prefix<'a, I>(candidates: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = prefix.to_lowercase();
    candidates
        .into_iter()
        .filter(|c| c.to_lowercase().starts_with(&prefix))
        .map(String::from)
        .collect()
}

/// Function pointer type for command handlers operating on state `S`.
pub type CommandFn<S> = fn(&mut S, &CommandContext) -> CommandResult;

/// A registered command.
pub struct CommandEntry<S> {
    pub name: String,
    pub description: String,
    pub handler: CommandFn<S>,
}

/// Registry of commands that run against some state `S`.
pub struct CommandRegistry<S> {
    commands: BTreeMap<String, CommandEntry<S>>,
}

impl<S> CommandRegistry<S> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register a command. Names are stored lowercased.
    pub fn register(&mut self, name: &str, description: &str, handler: CommandFn<S>) {
        let name = name.to_lowercase();
        self.commands.insert(
            name.clone(),
            CommandEntry {
                name,
                description: description.to_string(),
                handler,
            },
        );
    }

    /// Execute a command by name.
    pub fn execute(&self, name: &str, state: &mut S, ctx: &CommandContext) -> CommandResult {
        match self.commands.get(&name.to_lowercase()) {
            Some(entry) => (entry.handler)(state, ctx),
            None => CommandResult::err(format!(
                "Unknown command: {name}. Type help for a list of commands."
            )),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    /// `name - description` lines, sorted by name.
    pub fn help_lines(&self) -> Vec<String> {
        self.commands
            .values()
            .map(|c| format!("  {} - {}", c.name, c.description))
            .collect()
    }

    /// Registered names starting with `prefix`.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        complete_prefix(self.commands.keys().map(String::as_str), prefix)
    }
}

impl<S> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
