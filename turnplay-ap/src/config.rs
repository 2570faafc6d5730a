//! turnplay-ap runtime configuration
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--root-folder`, `--tick-ms`, `--log-level`)
//! 2. Environment variables (`TURNPLAY_ROOT_FOLDER`, `TURNPLAY_ROOT`)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! Settings are fixed at startup.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use turnplay_common::config::{RootFolderResolver, TomlConfig};
use turnplay_common::time::millis_to_duration;

/// Module name used for the TOML file and root folder resolution
pub const MODULE_NAME: &str = "turnplay-ap";

/// Shortest accepted tick interval (milliseconds)
const MIN_TICK_MS: u64 = 1;

/// Values supplied on the command line; `None` defers to lower tiers
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub tick_interval_ms: Option<u64>,
    pub log_level: Option<String>,
}

/// Resolved Audio Player configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder that turn `audio_path`s are resolved against
    pub root_folder: PathBuf,
    /// Position tick cadence of the clock backend
    pub tick_interval: Duration,
    /// Buffered events per EventBus subscriber
    pub event_bus_capacity: usize,
    pub log_level: String,
}

impl Config {
    /// Merge command-line overrides over a loaded TOML config
    ///
    /// # Errors
    /// [`Error::Config`] for a zero tick interval or event bus capacity.
    pub fn resolve(overrides: ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let root_folder = match overrides.root_folder {
            Some(path) => path,
            None => RootFolderResolver::new(MODULE_NAME)
                .with_config(toml)
                .resolve(),
        };

        let tick_ms = overrides
            .tick_interval_ms
            .unwrap_or(toml.playback.tick_interval_ms);
        if tick_ms < MIN_TICK_MS {
            return Err(Error::Config(format!(
                "tick_interval_ms must be at least {}, got {}",
                MIN_TICK_MS, tick_ms
            )));
        }

        if toml.playback.event_bus_capacity == 0 {
            return Err(Error::Config(
                "event_bus_capacity must be greater than 0".to_string(),
            ));
        }

        let config = Self {
            root_folder,
            tick_interval: millis_to_duration(tick_ms),
            event_bus_capacity: toml.playback.event_bus_capacity,
            log_level: overrides
                .log_level
                .unwrap_or_else(|| toml.logging.level.clone()),
        };

        info!(
            "Configuration: root_folder={}, tick={}ms, event_bus_capacity={}",
            config.root_folder.display(),
            tick_ms,
            config.event_bus_capacity
        );

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        let toml = TomlConfig::default();
        Self {
            root_folder: PathBuf::from("."),
            tick_interval: millis_to_duration(toml.playback.tick_interval_ms),
            event_bus_capacity: toml.playback.event_bus_capacity,
            log_level: toml.logging.level,
        }
    }
}
