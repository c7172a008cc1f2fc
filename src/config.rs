use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::chart::{DEFAULT_ANOMALY_THRESHOLD, DEFAULT_MOVING_AVERAGE_WINDOW};
use crate::exercise::time_slot::{DEFAULT_DISTINCT_HOUR_RATIO, DEFAULT_MIN_DISTINCT_HOURS};
use crate::exercise::weight_delta::{DEFAULT_WINDOW_HOURS, MAX_WINDOW_HOURS};
use crate::logging::LogConfig;
use crate::models::KCAL_PER_KG_FAT;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Analysis constants
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Tunable analysis constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Energy density of body fat (kcal per kg)
    pub kcal_per_kg_fat: f64,

    /// Search window on each side of an exercise session
    pub weight_delta_window_hours: i64,

    /// Time-data reliability floor on distinct session hours
    pub min_distinct_exercise_hours: f64,

    /// Time-data reliability: distinct hours required per logged session
    pub distinct_hour_ratio: f64,

    /// Day-to-day weight jump (jin) flagged as an anomaly
    pub anomaly_threshold: f64,

    /// Trailing samples in the weight moving average
    pub moving_average_window: usize,

    /// Year used to derive age from birth year; current local year when unset
    pub reference_year: Option<i32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            analysis: AnalysisConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            kcal_per_kg_fat: KCAL_PER_KG_FAT,
            weight_delta_window_hours: DEFAULT_WINDOW_HOURS,
            min_distinct_exercise_hours: DEFAULT_MIN_DISTINCT_HOURS,
            distinct_hour_ratio: DEFAULT_DISTINCT_HOUR_RATIO,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            reference_year: None,
        }
    }
}

impl AnalysisConfig {
    /// Reject values that would make the analytics meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.kcal_per_kg_fat.is_finite() && self.kcal_per_kg_fat > 0.0) {
            anyhow::bail!("kcal_per_kg_fat must be positive, got {}", self.kcal_per_kg_fat);
        }
        if !(1..=MAX_WINDOW_HOURS).contains(&self.weight_delta_window_hours) {
            anyhow::bail!(
                "weight_delta_window_hours must be between 1 and {}, got {}",
                MAX_WINDOW_HOURS,
                self.weight_delta_window_hours
            );
        }
        if self.moving_average_window == 0 {
            anyhow::bail!("moving_average_window must be at least 1");
        }
        if !(self.anomaly_threshold.is_finite() && self.anomaly_threshold >= 0.0) {
            anyhow::bail!("anomaly_threshold must be non-negative, got {}", self.anomaly_threshold);
        }
        if self.min_distinct_exercise_hours < 0.0 || self.distinct_hour_ratio < 0.0 {
            anyhow::bail!("time-data heuristic values must be non-negative");
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config
            .analysis
            .validate()
            .with_context(|| format!("Invalid analysis settings in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.healthrs/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".healthrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();
        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.analysis, deserialized.analysis);
        assert_eq!(config.logging.level, deserialized.logging.level);
    }

    #[test]
    fn test_analysis_defaults() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.kcal_per_kg_fat, 7700.0);
        assert_eq!(analysis.weight_delta_window_hours, 24);
        assert_eq!(analysis.moving_average_window, 7);
        assert_eq!(analysis.anomaly_threshold, 4.0);
        assert!(analysis.reference_year.is_none());
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_partial_analysis_section() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-03-01T00:00:00Z"
            updated_at = "2024-03-01T00:00:00Z"

            [analysis]
            anomaly_threshold = 3.0
            reference_year = 2024
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analysis.anomaly_threshold, 3.0);
        assert_eq!(config.analysis.reference_year, Some(2024));
        assert_eq!(config.analysis.kcal_per_kg_fat, 7700.0);
    }

    #[test]
    fn test_invalid_analysis_rejected() {
        let analysis = AnalysisConfig {
            moving_average_window: 0,
            ..AnalysisConfig::default()
        };
        assert!(analysis.validate().is_err());

        let analysis = AnalysisConfig {
            kcal_per_kg_fat: -1.0,
            ..AnalysisConfig::default()
        };
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_weight_delta_window_bounds() {
        let analysis = AnalysisConfig {
            weight_delta_window_hours: 10_000_000_000,
            ..AnalysisConfig::default()
        };
        assert!(analysis.validate().is_err());

        let analysis = AnalysisConfig {
            weight_delta_window_hours: 0,
            ..AnalysisConfig::default()
        };
        assert!(analysis.validate().is_err());

        let analysis = AnalysisConfig {
            weight_delta_window_hours: MAX_WINDOW_HOURS,
            ..AnalysisConfig::default()
        };
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.analysis.weight_delta_window_hours = 12;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.analysis.weight_delta_window_hours, 12);
        assert!(loaded.metadata.updated_at >= original.metadata.created_at);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = tempdir().unwrap();
        assert!(AppConfig::load_from_file(temp_dir.path().join("missing.toml")).is_err());
    }
}
