//! Core CLI loop, dispatch, and shell context helpers.

use std::io;

use dialoguer::Confirm;
use obra_config::ConfigError;
use obra_core::CoreError;
use obra_domain::{Ledger, Money};
use chrono::NaiveDate;
use strsim::levenshtein;

use crate::errors::AppError;
pub use crate::errors::CliError;

use super::output;
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::App(AppError::Core(err))
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::App(AppError::Config(err))
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::App(inner) => CliError::App(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());
        match self.dispatch(&command, raw, &args)? {
            LoopControl::Exit => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            LoopControl::Continue => Ok(LoopControl::Continue),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::hint(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Input(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Io(err) if self.mode == CliMode::Script => Err(err.into()),
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    /// Asks before destructive changes. Scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        super::io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn ledger(&self) -> &Ledger {
        self.state.ledger()
    }

    pub(crate) fn money(&self, amount: Money) -> String {
        self.currency.format_amount(amount)
    }

    pub(crate) fn date(&self, date: NaiveDate) -> String {
        self.dates.format_date(date)
    }

    pub(crate) fn prompt(&self) -> String {
        "obra> ".to_string()
    }

    pub(crate) fn command_completions(&self) -> Vec<(String, Vec<String>)> {
        self.registry.completion_table()
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    home: &std::path::Path,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let clock = std::sync::Arc::new(obra_core::FixedClock::on(
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
    ));
    let mut app = ShellContext::open(CliMode::Script, home.to_path_buf(), clock)?;
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err)?,
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use obra_domain::{EntryKind, EntryStatus};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn parse_line_handles_quotes() {
        let tokens = crate::cli::shell::parse_command_line(
            "project add name=\"Residencial Alfa\" description=\"Torre A\"",
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec!["project", "add", "name=Residencial Alfa", "description=Torre A"]
        );
    }

    #[test]
    fn script_records_and_settles_an_expense() {
        let dir = tempdir().unwrap();
        let context = process_script(
            dir.path(),
            &[
                "expense add project=proj-001 supplier=sup-001 account=ca-001 issue=2024-03-01 due=2024-03-31 \"item=Cimento|10|sc|15|cc-prod-cimento|prod1\"",
                "settle EXP-2024-00001 amount=60 date=2024-03-10",
                "exit",
            ],
        )
        .unwrap();

        let ledger = context.ledger();
        let entry = ledger.entry("EXP-2024-00001").expect("entry recorded");
        assert_eq!(entry.kind, EntryKind::Expense);
        assert_eq!(entry.total_amount, dec!(150));
        assert_eq!(entry.settled_amount, dec!(60));
        assert_eq!(entry.status, EntryStatus::PartiallySettled);
        assert!(!context.running);
    }

    #[test]
    fn failed_commands_leave_state_untouched() {
        let dir = tempdir().unwrap();
        let context = process_script(
            dir.path(),
            &[
                "expense add project=proj-001 supplier=sup-001 account=ca-001 issue=2024-03-01 due=2024-03-31 \"lump=Fôrmas|100|cc-estrutura\"",
                "expense add project=proj-001 supplier=sup-001 account=ca-001 issue=2024-03-01 due=2024-03-31 \"lump=Fôrmas|100|cc-estrutura-fund\"",
                "supplier remove sup-001",
                "settle EXP-2024-00001 amount=999",
                "settle EXP-2024-00042 amount=10",
            ],
        )
        .unwrap();
        let ledger = context.ledger();
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.entries[0].id, "EXP-2024-00001");
        assert!(ledger.settlements.is_empty());
        assert_eq!(ledger.suppliers.len(), 3);
    }

    #[test]
    fn unknown_commands_do_not_stop_the_shell() {
        let dir = tempdir().unwrap();
        let context = process_script(dir.path(), &["expnse list", "helpp"]).unwrap();
        assert!(context.running);
        assert_eq!(context.last_command.as_deref(), Some("helpp"));
    }
}
