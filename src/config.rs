/// Daemon configuration.
///
/// Loaded from a TOML file whose sections all have defaults, so a missing
/// file or a partial one is fine. Secrets come from the environment (or a
/// `.env` file) and override the file:
///
/// - `AQMON_API_TOKEN` → `provider.token`
/// - `DATABASE_URL`    → `cache.database_url`
///
/// ```toml
/// [provider]
/// base_url = "https://api.waqi.info"
/// timeout_secs = 10
///
/// [cache]
/// ttl_secs = 300
/// state_path = "aqmon_state.json"
///
/// [trend]
/// window_hours = 24
/// max_entries = 24
/// min_entries = 6
/// utc_offset_minutes = 0
///
/// [refresh]
/// interval_secs = 300
///
/// [logging]
/// level = "info"
/// file = "aqmon.log"
/// timestamps = true
/// ```

use chrono::{Duration, FixedOffset};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::alert::stalenesses::DEFAULT_TTL_SECS;
use crate::analysis::trend::TrendConfig;
use crate::ingest::waqi::{DEFAULT_TIMEOUT_SECS, WAQI_BASE_URL};
use crate::logging::LogLevel;

pub const TOKEN_ENV_VAR: &str = "AQMON_API_TOKEN";
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Cannot read config file: {}", e),
            ConfigError::Parse(msg) => write!(f, "Invalid config file: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: WAQI_BASE_URL.to_string(),
            token: "demo".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: i64,
    pub state_path: String,
    /// When set, state is kept in PostgreSQL instead of `state_path`.
    pub database_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: DEFAULT_TTL_SECS,
            state_path: "aqmon_state.json".to_string(),
            database_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendSection {
    pub window_hours: i64,
    pub max_entries: usize,
    pub min_entries: usize,
    pub utc_offset_minutes: i32,
}

impl Default for TrendSection {
    fn default() -> Self {
        TrendSection {
            window_hours: 24,
            max_entries: 24,
            min_entries: 6,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig { interval_secs: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub trend: TrendSection,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses TOML text and validates the result. Environment overrides
    /// are not applied.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` (defaults if it does not exist), then applies
    /// environment overrides from the process environment and `.env`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::from_toml_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    /// Applies secret overrides using `lookup` to read variables.
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.provider.token = token;
        }
        if let Some(url) = lookup(DATABASE_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.cache.database_url = Some(url);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
        }
        if self.cache.ttl_secs <= 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be > 0".into()));
        }
        if self.trend.window_hours <= 0 {
            return Err(ConfigError::Invalid("trend.window_hours must be > 0".into()));
        }
        if self.trend.max_entries == 0 {
            return Err(ConfigError::Invalid("trend.max_entries must be > 0".into()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid("refresh.interval_secs must be > 0".into()));
        }
        if self.trend_offset().is_none() {
            return Err(ConfigError::Invalid(format!(
                "trend.utc_offset_minutes out of range: {}",
                self.trend.utc_offset_minutes
            )));
        }
        self.log_level()?;
        Ok(())
    }

    fn trend_offset(&self) -> Option<FixedOffset> {
        self.trend
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging.level.parse().map_err(ConfigError::Invalid)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.cache.ttl_secs)
    }

    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn trend_config(&self) -> TrendConfig {
        let defaults = TrendConfig::default();
        TrendConfig {
            window: Duration::hours(self.trend.window_hours),
            max_entries: self.trend.max_entries,
            min_entries: self.trend.min_entries,
            utc_offset: self.trend_offset().unwrap_or(defaults.utc_offset),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
