use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{
    ErrorClassifier, RetryConfig, RetryExecutor, DEFAULT_RETRYABLE_CODES,
    DEFAULT_RETRYABLE_PHRASES,
};

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    /// Maximum number of attempts per call (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: f64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_factor: f64,
    /// Scale each delay by a random factor in [0.5, 1.0).
    pub jitter: bool,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30.0,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetrySection {
    /// Validate and convert into the runtime config.
    pub fn to_retry_config(&self) -> Result<RetryConfig> {
        let base_delay = Duration::try_from_secs_f64(self.base_delay_secs)
            .with_context(|| format!("invalid base_delay_secs {}", self.base_delay_secs))?;
        let max_delay = Duration::try_from_secs_f64(self.max_delay_secs)
            .with_context(|| format!("invalid max_delay_secs {}", self.max_delay_secs))?;
        let cfg = RetryConfig::new(
            self.max_attempts,
            base_delay,
            max_delay,
            self.backoff_factor,
            self.jitter,
        )?;
        Ok(cfg)
    }
}

/// Retryable code and phrase lists (`[classifier]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierSection {
    #[serde(default = "default_codes")]
    pub retryable_codes: Vec<String>,
    #[serde(default = "default_phrases")]
    pub retryable_phrases: Vec<String>,
}

fn default_codes() -> Vec<String> {
    DEFAULT_RETRYABLE_CODES.iter().map(|s| s.to_string()).collect()
}

fn default_phrases() -> Vec<String> {
    DEFAULT_RETRYABLE_PHRASES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            retryable_codes: default_codes(),
            retryable_phrases: default_phrases(),
        }
    }
}

impl ClassifierSection {
    pub fn to_classifier(&self) -> ErrorClassifier {
        ErrorClassifier::new(&self.retryable_codes, &self.retryable_phrases)
    }
}

/// Global configuration loaded from `~/.config/adsretry/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsRetryConfig {
    /// Retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetrySection>,
    /// Classifier lists; if missing, built-in defaults are used.
    #[serde(default)]
    pub classifier: Option<ClassifierSection>,
}

impl Default for AdsRetryConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetrySection::default()),
            classifier: Some(ClassifierSection::default()),
        }
    }
}

impl AdsRetryConfig {
    pub fn retry_config(&self) -> Result<RetryConfig> {
        match &self.retry {
            Some(section) => section.to_retry_config().context("invalid [retry] section"),
            None => Ok(RetryConfig::default()),
        }
    }

    pub fn classifier(&self) -> ErrorClassifier {
        self.classifier
            .as_ref()
            .map(ClassifierSection::to_classifier)
            .unwrap_or_default()
    }

    /// Executor built from both sections.
    pub fn executor(&self) -> Result<RetryExecutor> {
        Ok(RetryExecutor::with_classifier(
            self.retry_config()?,
            self.classifier(),
        ))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("adsretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AdsRetryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AdsRetryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file; it must exist.
pub fn load_from_path(path: &Path) -> Result<AdsRetryConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: AdsRetryConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
