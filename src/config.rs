use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

use crate::error::Error;
use crate::scheduler::SchedulerConfig;

pub const DEFAULT_STORE_PATH: &str = "hashes.db";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Units allowed to run at once (stuck units excluded).
    pub concurrency_limit: usize,
    pub running_long_secs: u64,
    pub abandon_after_secs: u64,
    pub monitor_interval_secs: u64,
    pub progress_interval_secs: u64,
    pub ignore_patterns: Vec<String>,
    pub store_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 6,
            running_long_secs: 60,
            abandon_after_secs: 5 * 60,
            monitor_interval_secs: 60,
            progress_interval_secs: 10,
            ignore_patterns: Vec::new(),
            store_path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Message(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.abandon_after_secs < self.running_long_secs {
            return Err(ConfigError::Message(format!(
                "abandon_after_secs ({}) must not be below running_long_secs ({})",
                self.abandon_after_secs, self.running_long_secs
            )));
        }
        if self.monitor_interval_secs == 0 {
            return Err(ConfigError::Message(
                "monitor_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            concurrency_limit: self.concurrency_limit,
            running_long: Duration::from_secs(self.running_long_secs),
            abandon_after: Duration::from_secs(self.abandon_after_secs),
            monitor_interval: Duration::from_secs(self.monitor_interval_secs),
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

/// Load `Config.toml` (optional) overlaid with `HASHFS_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, Error> {
    load_from("Config")
}

pub fn load_from(name: &str) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("HASHFS")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
