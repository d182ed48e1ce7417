//! # pmoplay Configuration Module
//!
//! This module provides configuration management for pmoplay, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//! let retries = config.get_max_start_retries()?;
//! let checkpoint = config.get_checkpoint_file()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmoplay.yaml");

const ENV_CONFIG_DIR: &str = "PMOPLAY_CONFIG";
const ENV_PREFIX: &str = "PMOPLAY_CONFIG__";
const LOCAL_CONFIG_DIR: &str = ".pmoplay";

// Default values for configuration
const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 3;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SETTLE_DELAY_SECS: u64 = 1;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_MAX_START_RETRIES: u64 = 10;
const DEFAULT_INSTANCE_ID: u64 = 0;
const DEFAULT_REFRESH_MAX_POLLS: u64 = 20;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 1;
const DEFAULT_CHECKPOINT_FILE: &str = "checkpoint";
const DEFAULT_STRICT_RESUME: bool = false;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Macro to generate getter/setter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<u64> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => Ok(n.as_u64().unwrap_or($default)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Macro to generate getter/setter for optional u64 values (absent or null means unset)
macro_rules! impl_opt_u64_config {
    ($getter:ident, $setter:ident, $path:expr) => {
        pub fn $getter(&self) -> Result<Option<u64>> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => Ok(n.as_u64()),
                _ => Ok(None),
            }
        }

        pub fn $setter(&self, value: Option<u64>) -> Result<()> {
            let value = value.map_or(Value::Null, |v| Value::Number(Number::from(v)));
            self.set_value($path, value)
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for pmoplay
///
/// The configuration lives in `<config_dir>/config.yaml`. Loading merges it
/// over the embedded defaults, applies `PMOPLAY_CONFIG__*` environment
/// overrides and writes the merged result back.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(LOCAL_CONFIG_DIR).exists() {
            return LOCAL_CONFIG_DIR.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(LOCAL_CONFIG_DIR);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        LOCAL_CONFIG_DIR.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Cannot create config directory {}", path.display()))?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOPLAY_CONFIG` environment variable
    /// 3. `.pmoplay` in the current directory
    /// 4. `.pmoplay` in the user's home directory
    ///
    /// The directory is created if it doesn't exist.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)
                    .with_context(|| format!("Invalid YAML in {}", path))?;
                merge_yaml(&mut default_value, &Self::lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file = %path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = Self::lower_keys_value(default_value);
        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Directory holding config.yaml
    pub fn dir(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = {
            let data = self.lock()?;
            serde_yaml::to_string(&*data)?
        };
        fs::write(&self.path, yaml).with_context(|| format!("Cannot write {}", self.path))?;
        debug!(config_file = %self.path, "Configuration saved");
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["playback", "max_start_retries"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock()?;
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock()?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                debug!(variable = %key, "Applying environment override");
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Résout un chemin relatif par rapport au répertoire de configuration
    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(path)
        }
    }

    impl_u64_config!(
        get_discovery_timeout_secs,
        set_discovery_timeout_secs,
        &["discovery", "timeout_secs"],
        DEFAULT_DISCOVERY_TIMEOUT_SECS
    );

    impl_u64_config!(
        get_http_timeout_secs,
        set_http_timeout_secs,
        &["discovery", "http_timeout_secs"],
        DEFAULT_HTTP_TIMEOUT_SECS
    );

    impl_u64_config!(
        get_settle_delay_secs,
        set_settle_delay_secs,
        &["playback", "settle_delay_secs"],
        DEFAULT_SETTLE_DELAY_SECS
    );

    impl_u64_config!(
        get_poll_interval_secs,
        set_poll_interval_secs,
        &["playback", "poll_interval_secs"],
        DEFAULT_POLL_INTERVAL_SECS
    );

    impl_u64_config!(
        get_max_start_retries,
        set_max_start_retries,
        &["playback", "max_start_retries"],
        DEFAULT_MAX_START_RETRIES
    );

    impl_u64_config!(
        get_instance_id,
        set_instance_id,
        &["playback", "instance_id"],
        DEFAULT_INSTANCE_ID
    );

    impl_u64_config!(
        get_refresh_max_polls,
        set_refresh_max_polls,
        &["playback", "refresh_max_polls"],
        DEFAULT_REFRESH_MAX_POLLS
    );

    impl_u64_config!(
        get_refresh_interval_secs,
        set_refresh_interval_secs,
        &["playback", "refresh_interval_secs"],
        DEFAULT_REFRESH_INTERVAL_SECS
    );

    impl_opt_u64_config!(
        get_pause_limit_polls,
        set_pause_limit_polls,
        &["playback", "pause_limit_polls"]
    );

    impl_opt_u64_config!(
        get_pause_refresh_polls,
        set_pause_refresh_polls,
        &["playback", "pause_refresh_polls"]
    );

    impl_bool_config!(
        get_strict_resume,
        set_strict_resume,
        &["resume", "strict"],
        DEFAULT_STRICT_RESUME
    );

    /// Chemin absolu du fichier de checkpoint
    pub fn get_checkpoint_file(&self) -> Result<PathBuf> {
        let file = match self.get_value(&["resume", "checkpoint_file"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_CHECKPOINT_FILE.to_string(),
        };
        Ok(self.resolve_path(&file))
    }

    pub fn set_checkpoint_file(&self, file: String) -> Result<()> {
        self.set_value(&["resume", "checkpoint_file"], Value::String(file))
    }

    /// Niveau de log par défaut (filtre `tracing`)
    pub fn get_log_level(&self) -> Result<String> {
        match self.get_value(&["log", "level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn set_log_level(&self, level: String) -> Result<()> {
        self.set_value(&["log", "level"], Value::String(level))
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
