//! Configuration management for Planwright
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PLANWRIGHT_*)
//! 3. Config file (~/.config/planwright/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generate::{GenerationOptions, DEFAULT_ACCEPTANCE_RATIO, DEFAULT_CACHE_CAPACITY};
use crate::plan::DEFAULT_DEDUP_THRESHOLD;
use crate::prompt::{DEFAULT_DURATION_DAYS, MAX_DURATION_DAYS};
use crate::{Error, Result};

/// Upper bound on `generation.max_retries`
pub const MAX_RETRIES: u32 = 10;

/// Retry, validation and caching policy
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Plan length when the request does not give one
    pub default_duration_days: u32,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Minimum share of expected tasks for acceptance
    pub acceptance_ratio: f64,
    /// Jaccard similarity at which tasks count as duplicates
    pub dedup_threshold: f64,
    /// Number of completed parses to keep
    pub cache_capacity: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_duration_days: DEFAULT_DURATION_DAYS,
            max_retries: 2,
            acceptance_ratio: DEFAULT_ACCEPTANCE_RATIO,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Text-generation service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// API base URL
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Sampling options
    #[serde(flatten)]
    pub options: GenerationOptions,

    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            options: GenerationOptions::default(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Request budget per requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: usize,

    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Generation policy
    pub generation: GenerationSettings,
    /// Text-generation service
    pub model: ModelConfig,
    /// Rate limiting
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/planwright/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("planwright").join("config.toml"))
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        if g.default_duration_days == 0 {
            return Err(Error::Config(
                "generation.default_duration_days must be at least 1".to_string(),
            ));
        }
        if g.default_duration_days > MAX_DURATION_DAYS {
            return Err(Error::Config(format!(
                "generation.default_duration_days must be at most {}, got {}",
                MAX_DURATION_DAYS, g.default_duration_days
            )));
        }
        if g.max_retries > MAX_RETRIES {
            return Err(Error::Config(format!(
                "generation.max_retries must be at most {}, got {}",
                MAX_RETRIES, g.max_retries
            )));
        }
        if !(0.0..=1.0).contains(&g.acceptance_ratio) {
            return Err(Error::Config(format!(
                "generation.acceptance_ratio must be between 0 and 1, got {}",
                g.acceptance_ratio
            )));
        }
        if !(0.0..=1.0).contains(&g.dedup_threshold) {
            return Err(Error::Config(format!(
                "generation.dedup_threshold must be between 0 and 1, got {}",
                g.dedup_threshold
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PLANWRIGHT_MODEL: Model name
    /// - PLANWRIGHT_BASE_URL: API base URL
    /// - PLANWRIGHT_MAX_RETRIES: Retries after the first attempt
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("PLANWRIGHT_MODEL") {
            self.model.model = model;
        }

        if let Ok(base_url) = std::env::var("PLANWRIGHT_BASE_URL") {
            self.model.base_url = base_url;
        }

        if let Some(retries) = std::env::var("PLANWRIGHT_MAX_RETRIES")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            self.generation.max_retries = retries;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, model: Option<String>, base_url: Option<String>) -> Self {
        if let Some(m) = model {
            self.model.model = m;
        }

        if let Some(url) = base_url {
            self.model.base_url = url;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(model: Option<String>, base_url: Option<String>) -> Result<Self> {
        Self::load()?.apply_overrides(model, base_url)
    }

    /// Layer env and CLI overrides on top of `self`, then validate the result
    pub fn apply_overrides(self, model: Option<String>, base_url: Option<String>) -> Result<Self> {
        let config = self.with_env_overrides().with_cli_overrides(model, base_url);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generation.default_duration_days, 90);
        assert_eq!(config.generation.max_retries, 2);
        assert_eq!(config.generation.acceptance_ratio, 0.7);
        assert_eq!(config.generation.dedup_threshold, 0.85);
        assert_eq!(config.generation.cache_capacity, 10);
        assert_eq!(config.model.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some("gemini-2.0-pro".to_string()),
            Some("http://localhost:8080".to_string()),
        );

        assert_eq!(config.model.model, "gemini-2.0-pro");
        assert_eq!(config.model.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[generation]
default_duration_days = 30
max_retries = 4

[model]
model = "gemini-2.0-flash"
temperature = 0.3
top_k = 20
timeout = "45s"

[rate_limit]
max_requests = 3
window = "5m"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.generation.default_duration_days, 30);
        assert_eq!(config.generation.max_retries, 4);
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.model.options.temperature, 0.3);
        assert_eq!(config.model.options.top_k, 20);
        assert_eq!(config.model.options.top_p, 0.95);
        assert_eq!(config.model.timeout, Duration::from_secs(45));
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window, Duration::from_secs(300));
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[model]
model = "custom"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // everything else should use defaults
        assert_eq!(config.model.model, "custom");
        assert_eq!(config.model.base_url, ModelConfig::default().base_url);
        assert_eq!(config.generation, GenerationSettings::default());
    }

    #[test]
    fn test_load_from_file_rejects_bad_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generation]\nacceptance_ratio = 1.5\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generation]\ncache_capacity = 3\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.generation.cache_capacity, 3);
    }

    #[test]
    fn test_validate_bounds_retries_and_duration() {
        let mut config = Config::default();
        config.generation.max_retries = 1000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("max_retries")));

        let mut config = Config::default();
        config.generation.default_duration_days = 2_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("default_duration_days")));

        let mut config = Config::default();
        config.generation.max_retries = MAX_RETRIES;
        config.generation.default_duration_days = MAX_DURATION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = Config::default();
        config.generation.max_retries = u32::MAX;
        let err = config
            .apply_overrides(Some("gemini-2.0-pro".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = Config::default()
            .apply_overrides(Some("gemini-2.0-pro".to_string()), None)
            .unwrap();
        assert_eq!(config.model.model, "gemini-2.0-pro");
    }
}
