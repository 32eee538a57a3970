//! Application Configuration
//!
//! Loaded from a TOML file, then overridden by `HOSPITAL_FORECAST__*`
//! environment variables (e.g. `HOSPITAL_FORECAST__HORIZON_DAYS=14`).

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use feature_engine::FeatureConfig;
use forecaster::{CapacityRule, PipelineConfig, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HOSPITAL_FORECAST";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// One resource entry of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub label: String,
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub target_column: String,
    pub feature_columns: Vec<String>,
    /// Capacity column used by `status`
    #[serde(default)]
    pub total_column: Option<String>,
    /// How `total_column` is read for `status`
    #[serde(default)]
    pub capacity_rule: CapacityRule,
}

impl ResourceConfig {
    /// Pipeline view of this resource
    pub fn to_spec(&self) -> ResourceSpec {
        ResourceSpec {
            name: self.name.clone(),
            label: self.label.clone(),
            source: self.data_path.to_string_lossy().into_owned(),
            target_column: self.target_column.clone(),
            feature_columns: self.feature_columns.clone(),
        }
    }
}

/// Visit-trend summary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    pub data_path: PathBuf,
    #[serde(default = "default_trend_column")]
    pub column: String,
}

fn default_trend_column() -> String {
    "er_visits".to_string()
}

fn default_horizon_days() -> usize {
    forecaster::DEFAULT_HORIZON_DAYS
}

fn default_window_length() -> usize {
    PipelineConfig::default().window_length
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,
    #[serde(default = "default_window_length")]
    pub window_length: usize,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// CSV export target; stdout when unset
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub trend: Option<TrendConfig>,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl AppConfig {
    /// Load `path` layered with environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("reading configuration {}", path.display()))?;

        Self::from_settings(settings)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("parsing configuration")?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            bail!("window_length must be positive");
        }
        for resource in &self.resources {
            if resource.feature_columns.is_empty() {
                bail!("resource {} lists no feature columns", resource.name);
            }
        }
        let mut names: Vec<&str> = self.resources.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("resource {} is configured twice", pair[0]);
        }
        Ok(())
    }

    /// Pipeline settings for a run
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            horizon_days: self.horizon_days,
            window_length: self.window_length,
            features: self.features.clone(),
        }
    }

    /// Pipeline view of every configured resource
    pub fn specs(&self) -> Vec<ResourceSpec> {
        self.resources.iter().map(ResourceConfig::to_spec).collect()
    }
}
