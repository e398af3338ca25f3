//! Configuration schema (apicompat.toml)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::change::Level;
use crate::rules::{catalog, Rule};

/// Which rules run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Only rules that participate in breaking-change detection, plus `include_checks`
    #[default]
    Breaking,

    /// Every rule, for changelog generation
    Changelog,
}

/// Level overrides for specific change ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityOverrides {
    /// Map of change id to level override
    #[serde(default)]
    pub overrides: BTreeMap<String, Level>,
}

impl SeverityOverrides {
    /// Get level for a change id, or default
    pub fn get_level(&self, id: &str, default: Level) -> Level {
        self.overrides.get(id).copied().unwrap_or(default)
    }

    /// Set level override for an id
    pub fn set_override(&mut self, id: impl Into<String>, level: Level) {
        self.overrides.insert(id.into(), level);
    }

    /// Parse `<id> <level>` lines; blank lines and `#` comments are skipped
    pub fn parse_lines(text: &str) -> Result<Self, ConfigError> {
        let mut overrides = Self::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(id), Some(level), None) = (fields.next(), fields.next(), fields.next()) else {
                return Err(ConfigError::ParseError(format!(
                    "line {}: expected '<id> <level>', got '{}'",
                    index + 1,
                    line
                )));
            };

            let level: Level = level
                .parse()
                .map_err(|e| ConfigError::ParseError(format!("line {}: {}", index + 1, e)))?;
            overrides.set_override(id, level);
        }

        Ok(overrides)
    }
}

/// Minimum deprecation windows, in days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationConfig {
    /// Minimum days between deprecation and sunset for beta endpoints
    #[serde(default = "default_beta_days")]
    pub min_sunset_beta_days: i64,

    /// Minimum days between deprecation and sunset for stable endpoints
    #[serde(default = "default_stable_days")]
    pub min_sunset_stable_days: i64,
}

fn default_beta_days() -> i64 {
    31
}

fn default_stable_days() -> i64 {
    180
}

impl Default for DeprecationConfig {
    fn default() -> Self {
        Self {
            min_sunset_beta_days: default_beta_days(),
            min_sunset_stable_days: default_stable_days(),
        }
    }
}

/// Main configuration structure
///
/// Immutable once validated; share it freely between evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which rules run
    #[serde(default)]
    pub mode: CheckMode,

    /// Rules that run in breaking mode even though they do not participate by default
    #[serde(default)]
    pub include_checks: BTreeSet<String>,

    /// Level overrides
    #[serde(default)]
    pub severity: SeverityOverrides,

    /// Deprecation windows
    #[serde(default)]
    pub deprecation: DeprecationConfig,
}

impl Config {
    /// Default configuration in changelog mode
    pub fn changelog() -> Self {
        Self {
            mode: CheckMode::Changelog,
            ..Self::default()
        }
    }

    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Every id named by the config must exist in the catalog
    pub fn validate(&self) -> Result<(), ConfigError> {
        let referenced = self
            .severity
            .overrides
            .keys()
            .chain(self.include_checks.iter());

        for id in referenced {
            if !catalog().contains(id) {
                return Err(ConfigError::UnknownRule(id.clone()));
            }
        }

        Ok(())
    }

    /// Add a level override, rejecting unknown ids
    pub fn with_override(mut self, id: &str, level: Level) -> Result<Self, ConfigError> {
        if !catalog().contains(id) {
            return Err(ConfigError::UnknownRule(id.to_string()));
        }
        self.severity.set_override(id, level);
        Ok(self)
    }

    /// Merge level overrides, rejecting unknown ids
    pub fn with_overrides(mut self, overrides: SeverityOverrides) -> Result<Self, ConfigError> {
        for (id, level) in overrides.overrides {
            self = self.with_override(&id, level)?;
        }
        Ok(self)
    }

    /// Enable a non-participating rule in breaking mode, rejecting unknown ids
    pub fn with_included_check(mut self, id: &str) -> Result<Self, ConfigError> {
        if !catalog().contains(id) {
            return Err(ConfigError::UnknownRule(id.to_string()));
        }
        self.include_checks.insert(id.to_string());
        Ok(self)
    }

    /// Effective level of an id; `None` for ids outside the catalog
    pub fn level(&self, id: &str) -> Option<Level> {
        catalog().get(id).map(|rule| self.severity.get_level(id, rule.level))
    }

    /// Whether the rule runs under this config
    pub fn is_active(&self, id: &str) -> bool {
        catalog().get(id).map_or(false, |rule| self.rule_active(rule))
    }

    fn rule_active(&self, rule: &Rule) -> bool {
        match self.mode {
            CheckMode::Changelog => true,
            CheckMode::Breaking => rule.participates || self.include_checks.contains(&rule.id),
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown rule id '{0}'")]
    UnknownRule(String),
}
