use crate::core::SettlementPolicy;
use crate::error::{Result, SettlementError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_DB_PATH: &str = "data/snapshots";
static DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE_KEY: &str = "SETTLEMENT_CONFIG";
const POLICY_KEY: &str = "SETTLEMENT_POLICY";
const PARALLEL_KEY: &str = "SETTLEMENT_PARALLEL";
const DB_PATH_KEY: &str = "SETTLEMENT_DB_PATH";
const LOG_LEVEL_KEY: &str = "SETTLEMENT_LOG_LEVEL";

/// Settings recognised in the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub policy: SettlementPolicy,
    pub parallel_verification: bool,
    pub db_path: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            policy: SettlementPolicy::Arrival,
            parallel_verification: false,
            db_path: DEFAULT_DB_PATH.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Settings> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SettlementError::Config(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(policy) = lookup(POLICY_KEY) {
            self.policy = policy.parse()?;
        }
        if let Some(parallel) = lookup(PARALLEL_KEY) {
            self.parallel_verification = parse_bool(&parallel).ok_or_else(|| {
                SettlementError::Config(format!("Invalid {PARALLEL_KEY} value: {parallel}"))
            })?;
        }
        if let Some(db_path) = lookup(DB_PATH_KEY) {
            self.db_path = db_path;
        }
        if let Some(level) = lookup(LOG_LEVEL_KEY) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Defaults, then the file named by `SETTLEMENT_CONFIG`, then env overrides
    pub fn load() -> Result<Settings> {
        let mut settings = match env::var(CONFIG_FILE_KEY) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Settings::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Process-wide settings
pub struct Config {
    inner: RwLock<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let settings = Settings::load().unwrap_or_else(|e| {
            log::warn!("Falling back to default settings: {e}");
            Settings::default()
        });
        Config {
            inner: RwLock::new(settings),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn get_policy(&self) -> SettlementPolicy {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).policy
    }

    pub fn get_db_path(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .db_path
            .clone()
    }

    pub fn is_parallel(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .parallel_verification
    }
}
