use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

const DEFAULT_HOME_DIR: &str = ".obra_finance";

/// Stores user-configurable shell preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the state document and backups. Defaults to `~/.obra_finance`.
    pub data_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default)]
    pub plain_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            data_root: None,
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            plain_output: false,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "pt-BR".into()
    }

    pub fn default_currency() -> String {
        "BRL".into()
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_HOME_DIR)
    }

    pub fn resolve_data_root(&self, home: &std::path::Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| home.to_path_buf())
    }

    /// Applies a `key value` pair from the `config set` command.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "locale" => self.locale = value.trim().to_string(),
            "currency" => self.currency = value.trim().to_uppercase(),
            "data_root" => {
                self.data_root = match value.trim() {
                    "" | "default" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            "backup_retention" => {
                let parsed: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("expected a whole number"))?;
                if parsed == 0 {
                    return Err(invalid("must keep at least one backup"));
                }
                self.backup_retention = parsed;
            }
            "ui_color_enabled" => self.ui_color_enabled = parse_flag(value).ok_or_else(|| invalid("expected on/off"))?,
            "plain_output" => self.plain_output = parse_flag(value).ok_or_else(|| invalid("expected on/off"))?,
            _ => return Err(invalid("unknown setting")),
        }
        Ok(())
    }

    /// `(key, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            (
                "data_root",
                self.data_root
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "default".into()),
            ),
            ("backup_retention", self.backup_retention.to_string()),
            ("ui_color_enabled", flag_label(self.ui_color_enabled).into()),
            ("plain_output", flag_label(self.plain_output).into()),
        ]
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn flag_label(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_brazilian() {
        let config = Config::default();
        assert_eq!(config.locale, "pt-BR");
        assert_eq!(config.currency, "BRL");
        assert_eq!(config.backup_retention, 5);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: Config = serde_json::from_str(r#"{"currency": "USD"}"#).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.locale, "pt-BR");
        assert!(config.ui_color_enabled);
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();
        config.set("plain_output", "on").unwrap();
        assert!(config.plain_output);
        assert!(config.set("backup_retention", "0").is_err());
        assert!(config.set("backup_retention", "abc").is_err());
        assert!(config.set("theme", "dark").is_err());
        config.set("data_root", "/tmp/obra").unwrap();
        assert_eq!(config.resolve_data_root(std::path::Path::new("/home")), PathBuf::from("/tmp/obra"));
    }
}
