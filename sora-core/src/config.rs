use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Storage key the gallery lives under.
pub const DEFAULT_STORAGE_KEY: &str = "sora-videos";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SoraConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: String,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "~/.local/share/sora".to_string(),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).into_owned())
    }
}

/// Timing and shape of the simulated generation job. Times are milliseconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub tick_interval_ms: u64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub settle_delay_ms: u64,
    pub max_increment: f64,
    pub progress_cap: f64,
    pub excerpt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            min_duration_ms: 3000,
            max_duration_ms: 5000,
            settle_delay_ms: 500,
            max_increment: 15.0,
            progress_cap: 95.0,
            excerpt_chars: 50,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "generation.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.min_duration_ms > self.max_duration_ms {
            return Err(ConfigError::Message(format!(
                "generation.min_duration_ms ({}) exceeds max_duration_ms ({})",
                self.min_duration_ms, self.max_duration_ms
            )));
        }
        if !(self.progress_cap > 0.0 && self.progress_cap < 100.0) {
            return Err(ConfigError::Message(format!(
                "generation.progress_cap must be within (0, 100), got {}",
                self.progress_cap
            )));
        }
        if !(self.max_increment >= 0.0) {
            return Err(ConfigError::Message(format!(
                "generation.max_increment must be non-negative, got {}",
                self.max_increment
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub dir: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).into_owned())
    }
}

impl SoraConfig {
    /// Layers the (optional) TOML file at `path` under `SORA__`-prefixed
    /// environment variables, e.g. `SORA__STORAGE__DIR=/tmp/sora`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SORA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.generation.validate()?;
        Ok(config)
    }
}
