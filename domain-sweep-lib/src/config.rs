//! Configuration file parsing and management.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, TOML files discovered on disk, and `DS_*` environment variables.
//! The result is a validated `SweepConfig`.
//!
//! The alphabet and the TLD are fixed and deliberately absent here.

use crate::error::DomainSweepError;
use crate::generate::{MAX_LENGTH, MIN_LENGTH};
use crate::protocols::checkapi::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DEFAULT_TOKEN};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default SQLite file.
pub const DEFAULT_DB_PATH: &str = "./domains.db";

/// Default log file; the date is inserted before the extension.
pub const DEFAULT_LOG_FILE: &str = "./runtime.log";

/// Default shortest label generated by `prepare`.
pub const DEFAULT_MIN_LENGTH: usize = 2;

/// Default longest label generated by `prepare`.
pub const DEFAULT_MAX_LENGTH: usize = 5;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Where the candidate store and log live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// Length range for the prepare phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    /// Availability check endpoint settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

/// Label length range.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Check endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Configuration discovery and loading.
#[derive(Debug, Default)]
pub struct ConfigManager {
    /// Files that were loaded, lowest precedence first
    pub loaded_files: Vec<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainSweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainSweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainSweepError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then `~/.domain-sweep.toml`, then `./domain-sweep.toml`;
    /// later files override earlier ones field by field. A file that exists
    /// but fails to load is an error.
    pub fn discover_and_load(&mut self) -> Result<FileConfig, DomainSweepError> {
        let mut merged_config = FileConfig::default();
        self.loaded_files.clear();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            self.loaded_files.push(path);
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./domain-sweep.toml", "./.domain-sweep.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|p| p.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            store: match (lower.store, higher.store) {
                (Some(lower), Some(higher)) => Some(StoreConfig {
                    db_path: higher.db_path.or(lower.db_path),
                    log_file: higher.log_file.or(lower.log_file),
                }),
                (lower, higher) => higher.or(lower),
            },
            generation: match (lower.generation, higher.generation) {
                (Some(lower), Some(higher)) => Some(GenerationConfig {
                    min_length: higher.min_length.or(lower.min_length),
                    max_length: higher.max_length.or(lower.max_length),
                }),
                (lower, higher) => higher.or(lower),
            },
            api: match (lower.api, higher.api) {
                (Some(lower), Some(higher)) => Some(ApiConfig {
                    endpoint: higher.endpoint.or(lower.endpoint),
                    token: higher.token.or(lower.token),
                    timeout: higher.timeout.or(lower.timeout),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a single file for obvious mistakes.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainSweepError> {
        if let Some(generation) = &config.generation {
            for length in [generation.min_length, generation.max_length]
                .into_iter()
                .flatten()
            {
                if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
                    return Err(DomainSweepError::config(format!(
                        "Label length {} must be between {} and {}",
                        length, MIN_LENGTH, MAX_LENGTH
                    )));
                }
            }
        }

        if let Some(timeout) = config.api.as_ref().and_then(|a| a.timeout.as_ref()) {
            if parse_timeout_string(timeout).is_none() {
                return Err(DomainSweepError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout
                )));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration (`DS_*`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub db_path: Option<String>,
    pub log_file: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<String>,
    /// Values that were set but ignored, one message each
    pub warnings: Vec<String>,
}

impl EnvConfig {
    /// Read `DS_*` values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        env_config.db_path = non_empty("DS_DB_PATH");
        env_config.log_file = non_empty("DS_LOG_FILE");
        env_config.endpoint = non_empty("DS_ENDPOINT");
        env_config.token = lookup("DS_TOKEN");

        for (key, slot) in [
            ("DS_MIN_LENGTH", &mut env_config.min_length),
            ("DS_MAX_LENGTH", &mut env_config.max_length),
        ] {
            if let Some(val) = lookup(key) {
                match val.trim().parse::<usize>() {
                    Ok(n) if (MIN_LENGTH..=MAX_LENGTH).contains(&n) => *slot = Some(n),
                    _ => env_config.warnings.push(format!(
                        "Invalid {}='{}', must be {}-{}",
                        key, val, MIN_LENGTH, MAX_LENGTH
                    )),
                }
            }
        }

        if let Some(timeout_str) = lookup("DS_TIMEOUT") {
            if parse_timeout_string(&timeout_str).is_some() {
                env_config.timeout = Some(timeout_str);
            } else {
                env_config.warnings.push(format!(
                    "Invalid DS_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                    timeout_str
                ));
            }
        }

        env_config
    }
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|key| env::var(key).ok())
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub db_path: PathBuf,
    pub log_file: PathBuf,
    pub min_length: usize,
    pub max_length: usize,
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: DEFAULT_TOKEN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SweepConfig {
    /// Layer file and environment settings over the defaults.
    pub fn resolve(file: &FileConfig, env: &EnvConfig) -> Result<Self, DomainSweepError> {
        let mut config = Self::default();

        if let Some(store) = &file.store {
            if let Some(p) = &store.db_path {
                config.db_path = PathBuf::from(p);
            }
            if let Some(p) = &store.log_file {
                config.log_file = PathBuf::from(p);
            }
        }
        if let Some(generation) = &file.generation {
            config.min_length = generation.min_length.unwrap_or(config.min_length);
            config.max_length = generation.max_length.unwrap_or(config.max_length);
        }
        if let Some(api) = &file.api {
            if let Some(endpoint) = &api.endpoint {
                config.endpoint = endpoint.clone();
            }
            if let Some(token) = &api.token {
                config.token = token.clone();
            }
            if let Some(timeout) = &api.timeout {
                config.timeout = parse_timeout(timeout)?;
            }
        }

        if let Some(p) = &env.db_path {
            config.db_path = PathBuf::from(p);
        }
        if let Some(p) = &env.log_file {
            config.log_file = PathBuf::from(p);
        }
        config.min_length = env.min_length.unwrap_or(config.min_length);
        config.max_length = env.max_length.unwrap_or(config.max_length);
        if let Some(endpoint) = &env.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(token) = &env.token {
            config.token = token.clone();
        }
        if let Some(timeout) = &env.timeout {
            config.timeout = parse_timeout(timeout)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainSweepError> {
        if self.min_length < MIN_LENGTH || self.max_length > MAX_LENGTH {
            return Err(DomainSweepError::invalid_length(
                if self.min_length < MIN_LENGTH {
                    self.min_length
                } else {
                    self.max_length
                },
                MIN_LENGTH,
                MAX_LENGTH,
            ));
        }
        if self.min_length > self.max_length {
            return Err(DomainSweepError::config(format!(
                "min_length {} is greater than max_length {}",
                self.min_length, self.max_length
            )));
        }
        if self.timeout.is_zero() {
            return Err(DomainSweepError::config("Timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Label lengths generated by `prepare`.
    pub fn lengths(&self) -> RangeInclusive<usize> {
        self.min_length..=self.max_length
    }
}

fn parse_timeout(timeout_str: &str) -> Result<Duration, DomainSweepError> {
    parse_timeout_string(timeout_str)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            DomainSweepError::config(format!("Invalid timeout format '{}'", timeout_str))
        })
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}
