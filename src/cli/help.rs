use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    for entry in registry.list() {
        output::info(format!("  {:<12} {}", entry.name, entry.description));
    }
    output::hint("Use `help <command>` for details. Options are written as key=value.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    output::info(format!("  Description: {}", entry.description));
    for (index, line) in entry.usage.lines().enumerate() {
        let label = if index == 0 { "  Usage:" } else { "        " };
        output::info(format!("{} {}", label, line.trim()));
    }
}
