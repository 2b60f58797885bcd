pub mod backup;
pub mod config;
pub mod cost_center;
pub mod entry;
pub mod export;
pub mod reference;
pub mod report;
pub mod settlement;
pub mod system;

use crate::cli::core::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(reference::definitions());
    commands.extend(cost_center::definitions());
    commands.extend(entry::definitions());
    commands.extend(settlement::definitions());
    commands.extend(report::definitions());
    commands.extend(export::definitions());
    commands.extend(backup::definitions());
    commands.extend(config::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    for entry in all_definitions() {
        registry.register(entry);
    }
    registry.alias("quit", "exit");
    registry.alias("cc", "costcenter");
    registry.alias("pay", "settle");
    registry.alias("receive", "settle");
}

/// Splits `args` into a lowercase subcommand and the remaining words.
pub(crate) fn split_subcommand<'a, 'b>(
    args: &'a [&'b str],
    usage: &str,
) -> Result<(String, &'a [&'b str]), CommandError> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.to_lowercase(), rest)),
        None => Err(CommandError::InvalidArguments(format!("usage: {}", usage))),
    }
}

pub(crate) fn unknown_subcommand(command: &str, sub: &str) -> CommandError {
    CommandError::InvalidArguments(format!("unknown {} subcommand `{}`", command, sub))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_registered_once() {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let names: Vec<&str> = registry.list().iter().map(|entry| entry.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
        assert!(registry.get("cc").is_some());
        assert_eq!(registry.get("quit").map(|entry| entry.name), Some("exit"));
    }

    #[test]
    fn subcommands_are_lowercased() {
        let (sub, rest) = split_subcommand(&["LIST", "from=2024-01-01"], "expense list").unwrap();
        assert_eq!(sub, "list");
        assert_eq!(rest, &["from=2024-01-01"]);
        assert!(split_subcommand(&[], "expense <list|add>").is_err());
    }
}
