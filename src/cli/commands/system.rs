use obra_domain::CURRENT_SCHEMA_VERSION;
use obra_storage_json::LoadOrigin;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "status",
            "Show where data lives and any consistency warnings",
            "status",
            cmd_status,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.registry.get(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Obra Finance {}", meta.version));
    output::info(format!("  CLI version  : {}", build_info::CLI_VERSION));
    output::info(format!("  Schema ver   : v{}", CURRENT_SCHEMA_VERSION));
    output::info(format!(
        "  Build hash   : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::info(format!("  Built at     : {}", meta.timestamp));
    output::info(format!("  Target       : {}", meta.target));
    output::info(format!("  Profile      : {}", meta.profile));
    output::info(format!("  Rustc        : {}", meta.rustc));
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let ledger = context.ledger();
    output::section("Status");
    output::info(format!("  Home         : {}", context.home.display()));
    if let Some(path) = context.state.state_path() {
        output::info(format!("  State file   : {}", path.display()));
    }
    let origin = match context.state.origin() {
        LoadOrigin::Existing => "loaded from disk".to_string(),
        LoadOrigin::Seeded => "seeded with sample data".to_string(),
        LoadOrigin::RecoveredFromCorrupt(moved) => {
            format!("recovered, unreadable file kept at {}", moved.display())
        }
    };
    output::info(format!("  Session      : {}", origin));
    output::info(format!(
        "  Last change  : {}",
        ledger.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output::info(format!(
        "  Records      : {} projects, {} cost centers, {} entries, {} settlements",
        ledger.projects.len(),
        ledger.cost_centers.len(),
        ledger.entries.len(),
        ledger.settlements.len()
    ));

    let warnings = context.state.warnings();
    if warnings.is_empty() {
        output::success("No consistency problems found.");
    } else {
        for warning in warnings {
            output::warning(warning);
        }
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
