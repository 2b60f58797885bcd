use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use obra_config::{Config, ConfigManager};
use obra_core::{
    format::{date_formatter_for, formatter_for, CurrencyFormatter, DateFormatter},
    Clock, FixedClock, SystemClock,
};
use obra_storage_json::LoadOrigin;
use tracing::info;

use crate::errors::CliError;
use crate::state::StateManager;
use crate::utils::{resolve_home, TODAY_ENV};

use super::commands;
use super::output::{self, OutputPreferences};
use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub state: StateManager,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub home: PathBuf,
    pub theme: ColorfulTheme,
    pub currency: Box<dyn CurrencyFormatter>,
    pub dates: Box<dyn DateFormatter>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::open(mode, resolve_home(), clock_from_env()?)
    }

    /// Loads the configuration under `home` and opens the state it points at.
    pub fn open(mode: CliMode, home: PathBuf, clock: Arc<dyn Clock>) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(home.clone())?;
        let config = config_manager.load()?;
        apply_output_preferences(&config, mode);

        let data_root = config.resolve_data_root(&home);
        let state = StateManager::open(data_root, config.backup_retention, clock)?;
        match state.origin() {
            LoadOrigin::Existing => {}
            LoadOrigin::Seeded => output::info("Started a new ledger from the sample data."),
            LoadOrigin::RecoveredFromCorrupt(moved) => output::warning(format!(
                "The saved state could not be read and was moved to {}. Started from the sample data.",
                moved.display()
            )),
        }
        info!(home = %home.display(), ?mode, "shell context ready");

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            registry,
            state,
            currency: formatter_for(&config.currency),
            dates: date_formatter_for(&config.locale),
            config_manager,
            config,
            home,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        })
    }

    /// Re-derives formatters and output switches after a configuration change.
    pub fn refresh_preferences(&mut self) {
        self.currency = formatter_for(&self.config.currency);
        self.dates = date_formatter_for(&self.config.locale);
        apply_output_preferences(&self.config, self.mode);
    }
}

fn apply_output_preferences(config: &Config, mode: CliMode) {
    output::set_preferences(OutputPreferences {
        color_enabled: config.ui_color_enabled && mode == CliMode::Interactive,
        plain_output: config.plain_output || mode == CliMode::Script,
    });
}

/// `$OBRA_FINANCE_TODAY` freezes the clock, which keeps scripted identifiers stable.
fn clock_from_env() -> Result<Arc<dyn Clock>, CliError> {
    match std::env::var(TODAY_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{} must be YYYY-MM-DD, got `{}`", TODAY_ENV, value))
            })?;
            Ok(Arc::new(FixedClock::on(date)))
        }
        _ => Ok(Arc::new(SystemClock)),
    }
}
