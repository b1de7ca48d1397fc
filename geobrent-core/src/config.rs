//! Analysis configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration. Dates are written as quoted strings: `start = "1990-01-01"`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::{default_periods, PeriodConfig};
use crate::data::DataConfig;
use crate::detector::DetectorConfig;
use crate::error::ConfigError;
use crate::window::WindowConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: DetectorConfig,
    pub window: WindowConfig,
    pub periods: Vec<PeriodConfig>,
    pub data: DataConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            window: WindowConfig::default(),
            periods: default_periods(),
            data: DataConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(format!("serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.window.validate()?;
        for period in &self.periods {
            if period.end.is_some_and(|end| end < period.start) {
                return Err(ConfigError::Invalid(format!(
                    "period '{}' ends before it starts",
                    period.name
                )));
            }
        }
        Ok(())
    }
}
