//! Configuration file handling
//!
//! The configuration lives in `hamster_cli.toml` in the user config directory
//! and has two tables: `[backend]` for the store and `[client]` for logging.
//! A missing file is replaced by a freshly written default one. Invalid values
//! abort startup.
//!
//! The file is read once into [`Config`], which is then handed to every
//! command by reference and never mutated.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::{AppDirs, APP_NAME};

/// Store kinds this build knows how to open
pub const REGISTERED_STORES: &[&str] = &["sqlite"];

const CONFIG_FILENAME: &str = "hamster_cli.toml";
const DAY_START_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unrecognized log level value in config: '{0}'. Use one of: debug, info, warning, error.")]
    UnrecognizedLogLevel(String),
    #[error("Unrecognized store option: '{0}'. Available stores: {stores}.", stores = REGISTERED_STORES.join(", "))]
    UnrecognizedStore(String),
    #[error("We encountered an error when parsing the config's 'day_start' value '{0}'. Expected 'HH:MM:SS'.")]
    InvalidDayStart(String),
    #[error("Invalid 'fact_min_delta' value {0}. It must not be negative.")]
    InvalidFactMinDelta(i64),
    #[error("Database engine '{0}' is not supported by this build. Use db_engine = \"sqlite\".")]
    UnsupportedEngine(String),
}

/// On-disk layout of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub backend: RawBackendConfig,
    #[serde(default)]
    pub client: RawClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBackendConfig {
    #[serde(default = "default_store")]
    pub store: String,
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_fact_min_delta")]
    pub fact_min_delta: i64,
    #[serde(default = "default_db_engine")]
    pub db_engine: String,
    /// Defaults to `hamster_cli.sqlite` in the user data directory
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub db_host: String,
    #[serde(default)]
    pub db_port: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
}

impl Default for RawBackendConfig {
    fn default() -> Self {
        RawBackendConfig {
            store: default_store(),
            day_start: default_day_start(),
            fact_min_delta: default_fact_min_delta(),
            db_engine: default_db_engine(),
            db_path: None,
            db_host: String::new(),
            db_port: String::new(),
            db_name: String::new(),
            db_user: String::new(),
            db_password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClientConfig {
    #[serde(default = "default_unsorted_localized")]
    pub unsorted_localized: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_console: bool,
    /// File name inside the user log directory. Empty disables file logging.
    #[serde(default = "default_log_filename")]
    pub log_filename: String,
}

impl Default for RawClientConfig {
    fn default() -> Self {
        RawClientConfig {
            unsorted_localized: default_unsorted_localized(),
            log_level: default_log_level(),
            log_console: false,
            log_filename: default_log_filename(),
        }
    }
}

fn default_store() -> String {
    "sqlite".to_string()
}

fn default_day_start() -> String {
    "00:00:00".to_string()
}

fn default_fact_min_delta() -> i64 {
    60
}

fn default_db_engine() -> String {
    "sqlite".to_string()
}

fn default_unsorted_localized() -> String {
    "Unsorted".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_filename() -> String {
    format!("{}.log", APP_NAME)
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub backend: BackendConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Sqlite,
}

impl Store {
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbConfig {
    Sqlite {
        path: PathBuf,
    },
    Remote {
        engine: String,
        host: String,
        port: Option<String>,
        name: String,
        user: String,
        password: String,
    },
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub store: Store,
    pub day_start: NaiveTime,
    /// Minimum duration of a complete fact, in seconds
    pub fact_min_delta: i64,
    pub db: DbConfig,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub unsorted_localized: String,
    pub log_level: LevelFilter,
    pub log_console: bool,
    pub logfile_path: Option<PathBuf>,
    /// Export target without extension; the export command appends one
    pub export_path: PathBuf,
}

impl Config {
    /// Read the config file, writing a default one first if there is none
    pub fn load(dirs: &AppDirs) -> Result<Config> {
        let path = config_path(dirs)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<RawConfig>(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(_) => {
                eprintln!(
                    "No valid config file found. Trying to create a new default config at: '{}'.",
                    path.display()
                );
                let raw = write_config_file(&path, dirs)?;
                eprintln!("A new default config file has been successfully created.");
                raw
            }
        };

        Config::from_raw(raw, path, dirs)
    }

    /// Validate a raw config and derive paths that depend on the environment
    pub fn from_raw(raw: RawConfig, path: PathBuf, dirs: &AppDirs) -> Result<Config> {
        let backend = parse_backend_config(&raw.backend, dirs)?;
        let client = parse_client_config(&raw.client, dirs)?;
        Ok(Config { path, backend, client })
    }
}

fn parse_backend_config(raw: &RawBackendConfig, dirs: &AppDirs) -> Result<BackendConfig> {
    let store = match raw.store.as_str() {
        "sqlite" => Store::Sqlite,
        other => return Err(ConfigError::UnrecognizedStore(other.to_string()).into()),
    };

    let day_start = NaiveTime::parse_from_str(raw.day_start.trim(), DAY_START_FORMAT)
        .map_err(|_| ConfigError::InvalidDayStart(raw.day_start.clone()))?;

    if raw.fact_min_delta < 0 {
        return Err(ConfigError::InvalidFactMinDelta(raw.fact_min_delta).into());
    }

    let db = if raw.db_engine == "sqlite" {
        let path = match &raw.db_path {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path(dirs)?,
        };
        DbConfig::Sqlite { path }
    } else {
        DbConfig::Remote {
            engine: raw.db_engine.clone(),
            host: raw.db_host.clone(),
            port: Some(raw.db_port.clone()).filter(|p| !p.is_empty()),
            name: raw.db_name.clone(),
            user: raw.db_user.clone(),
            password: raw.db_password.clone(),
        }
    };

    Ok(BackendConfig {
        store,
        day_start,
        fact_min_delta: raw.fact_min_delta,
        db,
    })
}

fn parse_client_config(raw: &RawClientConfig, dirs: &AppDirs) -> Result<ClientConfig> {
    let log_level = match raw.log_level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => return Err(ConfigError::UnrecognizedLogLevel(raw.log_level.clone()).into()),
    };

    let logfile_path = if raw.log_filename.trim().is_empty() {
        None
    } else {
        Some(dirs.user_log_dir()?.join(&raw.log_filename))
    };

    Ok(ClientConfig {
        unsorted_localized: raw.unsorted_localized.clone(),
        log_level,
        log_console: raw.log_console,
        logfile_path,
        export_path: dirs.user_data_dir()?.join("export"),
    })
}

/// Location of the config file
pub fn config_path(dirs: &AppDirs) -> Result<PathBuf> {
    Ok(dirs.user_config_dir()?.join(CONFIG_FILENAME))
}

fn default_db_path(dirs: &AppDirs) -> Result<PathBuf> {
    Ok(dirs.user_data_dir()?.join(format!("{}.sqlite", APP_NAME)))
}

/// Write a default config file to `path`, creating parent directories
pub fn write_config_file(path: &Path, dirs: &AppDirs) -> Result<RawConfig> {
    let mut raw = RawConfig::default();
    raw.backend.db_path = Some(default_db_path(dirs)?.display().to_string());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(&raw).context("Failed to serialize default config")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str, dirs: &AppDirs) -> Result<Config> {
        let raw: RawConfig = toml::from_str(text).unwrap();
        Config::from_raw(raw, PathBuf::from("test.toml"), dirs)
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = parse("", &dirs).unwrap();

        assert_eq!(config.backend.store, Store::Sqlite);
        assert_eq!(config.backend.day_start, NaiveTime::MIN);
        assert_eq!(config.backend.fact_min_delta, 60);
        assert_eq!(config.client.log_level, LevelFilter::Debug);
        assert!(!config.client.log_console);
        assert!(config.client.export_path.ends_with("export"));
        match config.backend.db {
            DbConfig::Sqlite { path } => assert!(path.ends_with("hamster_cli.sqlite")),
            other => panic!("Expected sqlite config, got {:?}", other),
        }
    }

    #[test]
    fn test_day_start_valid() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = parse("[backend]\nday_start = \"05:00:00\"\n", &dirs).unwrap();
        assert_eq!(config.backend.day_start, NaiveTime::from_hms_opt(5, 0, 0).unwrap());
    }

    #[test]
    fn test_day_start_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let err = parse("[backend]\nday_start = \"foobar\"\n", &dirs).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidDayStart(_))));
    }

    #[test]
    fn test_log_level_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let err = parse("[client]\nlog_level = \"foobar\"\n", &dirs).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::UnrecognizedLogLevel(_))));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = parse("[client]\nlog_level = \"WARNING\"\n", &dirs).unwrap();
        assert_eq!(config.client.log_level, LevelFilter::Warn);
    }

    #[test]
    fn test_invalid_store() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let err = parse("[backend]\nstore = \"foobar\"\n", &dirs).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::UnrecognizedStore(_))));
    }

    #[test]
    fn test_non_sqlite_engine_keeps_connection_details() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = parse(
            "[backend]\ndb_engine = \"postgres\"\ndb_host = \"db.local\"\ndb_port = \"5432\"\ndb_name = \"hamster\"\ndb_user = \"me\"\ndb_password = \"secret\"\n",
            &dirs,
        )
        .unwrap();
        assert_eq!(
            config.backend.db,
            DbConfig::Remote {
                engine: "postgres".to_string(),
                host: "db.local".to_string(),
                port: Some("5432".to_string()),
                name: "hamster".to_string(),
                user: "me".to_string(),
                password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_log_filename_disables_file_logging() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = parse("[client]\nlog_filename = \"\"\n", &dirs).unwrap();
        assert!(config.client.logfile_path.is_none());
    }

    #[test]
    fn test_load_writes_default_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let config = Config::load(&dirs).unwrap();

        assert!(config.path.exists());
        let text = std::fs::read_to_string(&config.path).unwrap();
        assert!(text.contains("[backend]"));
        assert!(text.contains("[client]"));
    }

    #[test]
    fn test_load_reads_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let path = config_path(&dirs).unwrap();
        std::fs::write(&path, "[backend]\nfact_min_delta = 0\n").unwrap();

        let config = Config::load(&dirs).unwrap();
        assert_eq!(config.backend.fact_min_delta, 0);
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let path = config_path(&dirs).unwrap();
        std::fs::write(&path, "[backend\nstore = ").unwrap();

        let err = Config::load(&dirs).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_write_config_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = AppDirs::under(temp_dir.path());
        let path = temp_dir.path().join("nested").join("dir").join("hamster.toml");

        let raw = write_config_file(&path, &dirs).unwrap();
        assert!(path.exists());
        assert!(raw.backend.db_path.is_some());
    }
}
