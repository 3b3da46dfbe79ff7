//! Tab completion for `/location`.

use spawnmgr_command::complete_prefix;

use crate::registry::LocationRegistry;

pub const SUBCOMMANDS: [&str; 7] = ["create", "set", "delete", "teleport", "list", "help", "admin"];
pub const ADMIN_SUBCOMMANDS: [&str; 2] = ["save", "load"];

/// Candidates for the last element of `args`.
pub fn complete(command: &str, args: &[String], locations: &LocationRegistry) -> Vec<String> {
    if !command.eq_ignore_ascii_case("location") {
        return Vec::new();
    }
    match args {
        [current] => complete_prefix(SUBCOMMANDS, current),
        [sub, current] => match sub.to_lowercase().as_str() {
            "set" | "delete" | "teleport" => {
                let names = locations.names();
                complete_prefix(names.iter().map(String::as_str), current)
            }
            "admin" => complete_prefix(ADMIN_SUBCOMMANDS, current),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
