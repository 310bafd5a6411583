use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parser::Severity;

pub const DEFAULT_BATCH_SIZE: usize = 200;
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 150;
pub const DEFAULT_COALESCE_INTERVAL_MS: u64 = 300;
pub const DEFAULT_VIEW_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the adb binary.
    pub adb_path: String,
    /// Device serial to tail. When unset, the first online device is used.
    pub device_serial: Option<String>,
    /// Server-side `TAG:LEVEL` filter specs passed to logcat verbatim.
    pub logcat_filters: Vec<String>,
    pub pipeline: PipelineConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Count trigger for the batch scheduler.
    pub batch_size: usize,
    /// Time trigger for the batch scheduler.
    pub batch_interval_ms: u64,
    /// Fixed-delay coalescing window on the consumer side.
    pub coalesce_interval_ms: u64,
    /// Bounded view capacity; overflow evicts oldest records.
    pub view_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub keyword: Option<String>,
    pub case_sensitive: bool,
    pub tag: Option<String>,
    /// Minimum severity symbol or name (`W`, `warning`, ...).
    pub min_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from file or environment variables.
    /// Priority: environment variables > config file > defaults.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("DROIDTAIL_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/droidtail/config.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::from_env()
        };

        // Environment variables override file config
        if let Ok(path) = std::env::var("DROIDTAIL_ADB_PATH") {
            config.adb_path = path;
        }
        if let Ok(serial) = std::env::var("DROIDTAIL_DEVICE") {
            config.device_serial = Some(serial);
        }

        Ok(config)
    }

    /// Load configuration from TOML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            adb_path: std::env::var("DROIDTAIL_ADB_PATH").unwrap_or_else(|_| "adb".to_string()),
            device_serial: std::env::var("DROIDTAIL_DEVICE").ok(),
            logcat_filters: Vec::new(),
            pipeline: PipelineConfig::from_env(),
            filter: FilterConfig::default(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.adb_path.is_empty() {
            return Err("adb_path must not be empty".to_string());
        }
        self.pipeline.validate()?;
        if let Some(ref level) = self.filter.min_level {
            if parse_min_level(level).is_none() {
                return Err(format!("unknown filter.min_level: {level}"));
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_serial: None,
            logcat_filters: Vec::new(),
            pipeline: PipelineConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            batch_size: std::env::var("DROIDTAIL_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
            batch_interval_ms: std::env::var("DROIDTAIL_BATCH_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_INTERVAL_MS),
            coalesce_interval_ms: std::env::var("DROIDTAIL_COALESCE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_COALESCE_INTERVAL_MS),
            view_capacity: std::env::var("DROIDTAIL_VIEW_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_VIEW_CAPACITY),
        }
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn coalesce_interval(&self) -> Duration {
        Duration::from_millis(self.coalesce_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("pipeline.batch_size must be > 0".to_string());
        }
        if self.batch_interval_ms == 0 {
            return Err("pipeline.batch_interval_ms must be > 0".to_string());
        }
        if self.coalesce_interval_ms == 0 {
            return Err("pipeline.coalesce_interval_ms must be > 0".to_string());
        }
        if self.view_capacity == 0 {
            return Err("pipeline.view_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval_ms: DEFAULT_BATCH_INTERVAL_MS,
            coalesce_interval_ms: DEFAULT_COALESCE_INTERVAL_MS,
            view_capacity: DEFAULT_VIEW_CAPACITY,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keyword: None,
            case_sensitive: false,
            tag: None,
            min_level: None,
        }
    }
}

impl FilterConfig {
    pub fn min_severity(&self) -> Option<Severity> {
        self.min_level.as_deref().and_then(parse_min_level)
    }
}

/// Accepts a severity symbol (`W`) or name (`warning`).
fn parse_min_level(s: &str) -> Option<Severity> {
    if s.len() == 1 {
        return Severity::from_symbol(s.chars().next()?);
    }
    match s.to_ascii_lowercase().as_str() {
        "verbose" => Some(Severity::Verbose),
        "debug" => Some(Severity::Debug),
        "info" => Some(Severity::Info),
        "warning" | "warn" => Some(Severity::Warning),
        "error" => Some(Severity::Error),
        "fatal" => Some(Severity::Fatal),
        _ => None,
    }
}
