pub mod build_info;

use std::{
    env,
    path::PathBuf,
    sync::Once,
};

use obra_config::Config;

/// Overrides the application home directory (config, state and backups).
pub const HOME_ENV: &str = "OBRA_FINANCE_HOME";
/// Fixes "today" for scripted runs.
pub const TODAY_ENV: &str = "OBRA_FINANCE_TODAY";
/// Switches the shell to line-by-line script mode on stdin.
pub const SCRIPT_ENV: &str = "OBRA_FINANCE_CLI_SCRIPT";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{
            filter::{Directive, LevelFilter},
            fmt, EnvFilter,
        };

        let directive = "obra_finance=info"
            .parse::<Directive>()
            .unwrap_or_else(|_| LevelFilter::INFO.into());
        let filter = EnvFilter::from_default_env().add_directive(directive);

        // Tests install their own subscriber first.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// `$OBRA_FINANCE_HOME`, else `~/.obra_finance`.
pub fn resolve_home() -> PathBuf {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_home)
}
