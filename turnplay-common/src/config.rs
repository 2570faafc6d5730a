//! Configuration loading and root folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`TURNPLAY_ROOT_FOLDER`, then `TURNPLAY_ROOT`)
//! 3. TOML config file (`<config_dir>/turnplay/<module>.toml`)
//! 4. OS-dependent compiled defaults
//!
//! A missing config file is never fatal: the loader warns and falls back to
//! defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Primary environment variable for the root folder
pub const ROOT_FOLDER_ENV: &str = "TURNPLAY_ROOT_FOLDER";

/// Secondary (short) environment variable for the root folder
pub const ROOT_ENV: &str = "TURNPLAY_ROOT";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Folder that `audio_path` URLs are resolved against
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Playback tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Position tick cadence of the clock backend (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Buffered events per EventBus subscriber
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_event_bus_capacity() -> usize {
    100
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.local/share/turnplay, ~/Library/Application Support/turnplay, %LOCALAPPDATA%\turnplay
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("turnplay"))
            .unwrap_or_else(|| PathBuf::from("./turnplay_data"));

        Self {
            root_folder,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Default TOML location for a module: `<config_dir>/turnplay/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("turnplay").join(format!("{}.toml", module_name)))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))
}

/// Load the config file, falling back to defaults when it is missing
///
/// An explicit `path` that exists but fails to parse is an error; a missing
/// file only produces a warning.
pub fn load_or_default(path: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    let candidate = match path {
        Some(p) => Some(p.to_path_buf()),
        None => config_file_path(module_name),
    };

    match candidate {
        Some(p) if p.exists() => {
            let config = load_toml_config(&p)?;
            info!("Loaded configuration from {}", p.display());
            Ok(config)
        }
        Some(p) => {
            if path.is_some() {
                warn!("Config file {} not found, using defaults", p.display());
            } else {
                debug!("No config file at {}, using defaults", p.display());
            }
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Root folder resolution (environment > TOML > compiled default)
///
/// Command-line overrides are applied by the caller before consulting the resolver.
pub struct RootFolderResolver {
    module_name: String,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            toml_root: None,
        }
    }

    /// Use an already-loaded TOML config instead of reading the module's file
    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            debug!("Root folder from {}", ROOT_FOLDER_ENV);
            return PathBuf::from(path);
        }

        if let Ok(path) = std::env::var(ROOT_ENV) {
            debug!("Root folder from {}", ROOT_ENV);
            return PathBuf::from(path);
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        if let Some(config_path) = config_file_path(&self.module_name) {
            if let Ok(config) = load_toml_config(&config_path) {
                if let Some(root) = config.root_folder {
                    return root;
                }
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Map a turn's `audio_path` to a file under `root_folder`
///
/// Existing absolute paths are used unchanged; URL-style paths
/// (`/sessions/abc/turn_0.wav`) are taken relative to the root.
pub fn resolve_audio_path(root_folder: &Path, audio_path: &str) -> PathBuf {
    let as_path = Path::new(audio_path);
    if as_path.is_absolute() && as_path.exists() {
        return as_path.to_path_buf();
    }
    root_folder.join(audio_path.trim_start_matches('/'))
}
