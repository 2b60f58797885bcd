use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "backup",
            "Snapshot the current state",
            "backup [note]",
            cmd_backup,
        ),
        CommandEntry::new("backups", "List saved snapshots", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Replace the current state with a snapshot",
            "restore <backup-id>",
            cmd_restore,
        ),
    ]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context.state.backup(note.as_deref())?;
    output::success(format!("Backup {} written.", info.id));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.state.backups()?;
    if backups.is_empty() {
        output::warning("No backups found.");
        return Ok(());
    }
    let mut table = Table::new(
        Some("Backups (newest first)"),
        vec![TableColumn::new("ID"), TableColumn::new("Created")],
    );
    for backup in backups {
        table.add_row(vec![backup.id, backup.created_at]);
    }
    TableRenderer::print(&table);
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(id) = args.first() else {
        return Err(crate::cli::core::CommandError::InvalidArguments(
            "usage: restore <backup-id>".into(),
        ));
    };
    if !context.confirm(&format!("Replace the current state with {}?", id))? {
        output::info("Restore cancelled.");
        return Ok(());
    }
    let info = context.state.restore(id)?;
    output::success(format!("Restored {}.", info.id));
    Ok(())
}
