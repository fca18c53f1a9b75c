//! Configuration management for the fraud risk scorer

use crate::models::rules::{RuleSet, DEFAULT_JITTER};
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming assessment requests
    pub assess_subject: String,
    /// Prefix of the metadata subjects (`<prefix>.merchants`, ...)
    pub metadata_prefix: String,
    /// Subject for block alerts
    pub alert_subject: String,
    /// Queue group shared by all scorer instances
    pub queue_group: String,
}

/// Rule-based scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Perturbation amplitude added to rule scores (0 disables it)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Merchant and category risk sets
    #[serde(default)]
    pub rules: RuleSet,
}

fn default_jitter() -> f64 {
    DEFAULT_JITTER
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_JITTER,
            rules: RuleSet::default(),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Inference deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    250
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, then apply `FRAUD__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scorer cannot honour
    pub fn validate(&self) -> Result<()> {
        self.scoring
            .validate()
            .context("Invalid [scoring] configuration")
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.jitter.is_finite() || !(0.0..=DEFAULT_JITTER).contains(&self.jitter) {
            bail!(
                "jitter must be a finite value in [0, {}], got {}",
                DEFAULT_JITTER,
                self.jitter
            );
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                assess_subject: "fraud.assess".to_string(),
                metadata_prefix: "fraud.meta".to_string(),
                alert_subject: "fraud.alerts".to_string(),
                queue_group: "fraud-scorers".to_string(),
            },
            scoring: ScoringConfig::default(),
            model: ModelConfig::default(),
            pipeline: PipelineConfig {
                workers: 8,
                report_interval_secs: default_report_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
