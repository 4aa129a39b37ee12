use crate::storage::StorageBackend;
use crate::store::DEFAULT_DATE_FORMAT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = ".expense-tracker";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "expense-tracker.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageSection,
    pub display: DisplaySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    /// Defaults to ~/.expense-tracker when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    pub currency_symbol: String,
    /// chrono format string for the date stamped on new expenses
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// EnvFilter directive; RUST_LOG wins when set
    pub level: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl DisplaySection {
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}

impl Config {
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => app_home(),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(LOG_FILE))
    }
}

pub fn app_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(APP_DIR))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(app_home()?.join(CONFIG_FILE))
}

/// Read the config at `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the default config unless one exists. Returns whether a file was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(&tmp.path().join("none.toml")).unwrap();

        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.display.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            concat!(
                "[storage]\nbackend = \"json\"\ndata_dir = \"/tmp/expenses\"\n\n",
                "[display]\ncurrency_symbol = \"₹\"\n",
            ),
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();

        assert_eq!(cfg.storage.backend, StorageBackend::Json);
        assert_eq!(cfg.data_dir().unwrap(), PathBuf::from("/tmp/expenses"));
        assert_eq!(cfg.display.currency_symbol, "₹");
        assert_eq!(cfg.display.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn test_init_then_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sub").join("config.toml");

        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_backend_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[storage]\nbackend = \"redis\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_format_amount() {
        let display = DisplaySection::default();
        assert_eq!(display.format_amount(200.0), "$200.00");
    }
}
