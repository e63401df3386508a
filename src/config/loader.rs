//! Configuration loader

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::audit::scoring::Scorer;
use crate::error::ConfigError;
use crate::tools::Tool;

use super::presets::Preset;
use super::{ChecksConfig, ExecutionConfig, QuickConfig, ReportsConfig, ScanConfig, ScoringConfig, ToolsConfig};

pub const CONFIG_FILENAME: &str = ".ultra-audit.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub checks: ChecksConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub reports: ReportsConfig,

    #[serde(default)]
    pub quick: QuickConfig,
}

impl Config {
    /// Load `.ultra-audit.toml` from the project root, or return defaults
    pub fn load_or_default(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILENAME);

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scorer()?;
        self.disabled_tools()?;
        self.exclude_set()?;

        if self.execution.jobs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.jobs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.execution.check_timeout_secs == 0 || self.execution.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution timeouts",
                message: "must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    /// Build the scorer from the preset plus overrides
    pub fn scorer(&self) -> Result<Scorer, ConfigError> {
        let preset = Preset::from_name(&self.scoring.preset)
            .ok_or_else(|| ConfigError::UnknownPreset(self.scoring.preset.clone()))?;

        let weights = self.scoring.weights.apply(preset.weights());
        let thresholds = self.scoring.thresholds.apply(preset.thresholds());

        if !thresholds.is_ordered() {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds",
                message: "grade thresholds must decrease from a_plus to c and not exceed 100"
                    .to_string(),
            });
        }

        Ok(Scorer::new(weights, thresholds))
    }

    /// Tools disabled in configuration
    pub fn disabled_tools(&self) -> Result<Vec<Tool>, ConfigError> {
        self.tools
            .disabled
            .iter()
            .map(|name| {
                Tool::from_name(name).ok_or_else(|| ConfigError::InvalidValue {
                    field: "tools.disabled",
                    message: format!("unknown tool '{}'", name),
                })
            })
            .collect()
    }

    /// Compiled `[scan] exclude` patterns
    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.scan.exclude {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Glob {
            pattern: self.scan.exclude.join(", "),
            source,
        })
    }

    /// Check if a check is enabled (`category/check`)
    pub fn is_check_enabled(&self, check_id: &str) -> bool {
        !self.checks.disabled.iter().any(|c| c == check_id)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.check_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.command_timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.execution.deadline_secs.map(Duration::from_secs)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
