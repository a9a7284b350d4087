//! Configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority, parsed by the binaries)
//! 2. Environment variable (also via the binaries' `clap` env fallbacks)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and compiled
//! defaults are used. A config file that exists but does not parse or
//! validate is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "SENTISHIFT_CONFIG";

/// Complete TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database: DatabaseConfig,
    pub scoring: ScoringConfig,
    pub enrichment: EnrichmentConfig,
    pub retry: RetryConfig,
    pub detection: DetectionConfig,
    pub lock: LockConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    /// Platforms to run detection for
    pub platforms: Vec<String>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scoring: ScoringConfig::default(),
            enrichment: EnrichmentConfig::default(),
            retry: RetryConfig::default(),
            detection: DetectionConfig::default(),
            lock: LockConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            platforms: vec!["reddit".to_string(), "x".to_string()],
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `None` means the OS data directory default
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout_ms: 250,
            acquire_timeout_ms: 5000,
        }
    }
}

/// `[scoring]` - external NLP scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            timeout_ms: 20_000,
        }
    }
}

/// `[enrichment]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Unscored records selected per run
    pub batch_size: u32,
    /// Scored rows buffered before each insert
    pub flush_chunk_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            flush_chunk_size: 25,
        }
    }
}

/// `[retry]` - exponential backoff for store and scoring calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5000,
        }
    }
}

/// How window sizes are recorded on shift events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowMetadata {
    /// Record the lengths of the slices the before/after means came from
    #[default]
    SliceLengths,
    /// Record fixed constants, independent of the computation
    Fixed { before: i64, after: i64 },
}

/// `[detection]` - change-point segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Cost added per segment; higher means fewer shifts
    pub penalty: f64,
    /// Per-platform penalty overrides
    pub platform_penalty: BTreeMap<String, f64>,
    /// Series shorter than this are not analysed
    pub min_points: usize,
    /// Shortest allowed segment
    pub min_segment_size: usize,
    /// Candidate change points are restricted to multiples of this
    pub jump: usize,
    /// Analyse only the trailing N buckets (bounds the kernel matrix)
    pub max_points: Option<usize>,
    pub window_metadata: WindowMetadata,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            penalty: 10.0,
            platform_penalty: BTreeMap::new(),
            min_points: 10,
            min_segment_size: 2,
            jump: 1,
            max_points: Some(2160),
            window_metadata: WindowMetadata::default(),
        }
    }
}

impl DetectionConfig {
    /// Penalty for `platform`, falling back to the global penalty
    pub fn penalty_for(&self, platform: &str) -> f64 {
        self.platform_penalty
            .get(platform)
            .copied()
            .unwrap_or(self.penalty)
    }
}

/// `[lock]` - run-level mutual exclusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub name: String,
    /// Lease lifetime; a crashed run releases after this long
    pub ttl_secs: i64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            name: "sentishift-pipeline".to_string(),
            ttl_secs: 900,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[api]` - read-only query service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the resolved config path, or fall back to defaults
    ///
    /// Missing file → warning + defaults. Present but invalid → error.
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Fail fast on settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !(d.penalty.is_finite() && d.penalty > 0.0) {
            return Err(Error::Config(format!(
                "detection.penalty must be a positive number, got {}",
                d.penalty
            )));
        }
        for (platform, penalty) in &d.platform_penalty {
            if !(penalty.is_finite() && *penalty > 0.0) {
                return Err(Error::Config(format!(
                    "detection.platform_penalty.{} must be a positive number, got {}",
                    platform, penalty
                )));
            }
        }
        if d.min_points < 2 {
            return Err(Error::Config("detection.min_points must be >= 2".to_string()));
        }
        if d.min_segment_size < 1 {
            return Err(Error::Config("detection.min_segment_size must be >= 1".to_string()));
        }
        if d.jump < 1 {
            return Err(Error::Config("detection.jump must be >= 1".to_string()));
        }
        if let Some(max) = d.max_points {
            if max < d.min_points {
                return Err(Error::Config(format!(
                    "detection.max_points ({}) must be >= detection.min_points ({})",
                    max, d.min_points
                )));
            }
        }
        if self.enrichment.batch_size < 1 {
            return Err(Error::Config("enrichment.batch_size must be >= 1".to_string()));
        }
        if self.enrichment.flush_chunk_size < 1 {
            return Err(Error::Config("enrichment.flush_chunk_size must be >= 1".to_string()));
        }
        if self.retry.max_attempts < 1 {
            return Err(Error::Config("retry.max_attempts must be >= 1".to_string()));
        }
        if self.lock.ttl_secs < 1 {
            return Err(Error::Config("lock.ttl_secs must be >= 1".to_string()));
        }
        if self.scoring.base_url.trim().is_empty() {
            return Err(Error::Config("scoring.base_url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Database file: CLI/env value, then TOML, then OS default
    pub fn resolve_database_path(&self, cli_or_env: Option<PathBuf>) -> PathBuf {
        cli_or_env
            .or_else(|| self.database.path.clone())
            .unwrap_or_else(default_database_path)
    }
}

/// Config file path: CLI argument, then `SENTISHIFT_CONFIG`, then the user config dir
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("sentishift").join("config.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sentishift"))
        .unwrap_or_else(|| PathBuf::from("./sentishift_data"))
        .join("sentishift.db")
}
