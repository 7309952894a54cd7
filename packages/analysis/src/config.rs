//! Analysis configuration.
//!
//! Defaults live in `config/default.toml`, embedded at compile time. An
//! override file (from `--config` or `PLOT_TWIST_CONFIG`) is merged over
//! them key by key, so it only needs the settings it changes. Two
//! environment variables then override single values:
//!
//! - `PLOT_TWIST_OFFLINE`: `1`/`true`/`yes` disables the authoritative
//!   zoning lookup.
//! - `PLOT_TWIST_LOOKUP_TIMEOUT_SECS`: authoritative lookup deadline.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use plot_twist_zoning::ResolverConfig;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;
use crate::feasibility::FeasibilityThresholds;
use crate::opportunities::OpportunityThresholds;
use crate::risk::RiskThresholds;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

pub const CONFIG_ENV: &str = "PLOT_TWIST_CONFIG";
pub const OFFLINE_ENV: &str = "PLOT_TWIST_OFFLINE";
pub const TIMEOUT_ENV: &str = "PLOT_TWIST_LOOKUP_TIMEOUT_SECS";

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Year used for age-based rules. `None` means the current UTC year.
    pub as_of_year: Option<i32>,
    pub feasibility: FeasibilityThresholds,
    pub risk: RiskThresholds,
    pub opportunities: OpportunityThresholds,
    pub zoning: ResolverConfig,
}

impl AnalysisConfig {
    /// The embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default configuration is malformed.
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded config 'default.toml': {e}"))
    }

    /// Merges `overrides` over the embedded defaults and validates the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Toml`] if `overrides` is not valid TOML or
    /// has the wrong shape, or [`AnalysisError::Config`] if a merged value
    /// is out of range.
    pub fn from_toml_str(overrides: &str) -> Result<Self, AnalysisError> {
        let mut merged: toml::Table = toml::de::from_str(DEFAULT_TOML)?;
        let overrides: toml::Table = toml::de::from_str(overrides)?;
        merge_tables(&mut merged, overrides);

        let config: Self = toml::Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration the way the binaries do: defaults, then the
    /// override file at `path` (or named by `PLOT_TWIST_CONFIG`), then
    /// single-value environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the override file cannot be read,
    /// or any error from [`Self::from_toml_str`] and
    /// [`Self::apply_overrides`].
    pub fn load(path: Option<&Path>) -> Result<Self, AnalysisError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(&path)?)?
            }
            None => Self::embedded(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies single-value overrides looked up by environment variable
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if an override cannot be parsed.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AnalysisError> {
        if let Some(value) = lookup(OFFLINE_ENV) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.zoning.authoritative_enabled = false,
                "0" | "false" | "no" | "" => {}
                other => {
                    return Err(AnalysisError::Config {
                        message: format!("{OFFLINE_ENV} must be a boolean, got '{other}'"),
                    });
                }
            }
        }

        if let Some(value) = lookup(TIMEOUT_ENV) {
            self.zoning.timeout_secs =
                value.trim().parse().map_err(|_| AnalysisError::Config {
                    message: format!("{TIMEOUT_ENV} must be a whole number of seconds, got '{value}'"),
                })?;
        }

        self.validate()
    }

    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if a threshold or lookup setting is
    /// out of range.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.feasibility.validate()?;
        self.risk.validate()?;
        self.opportunities.validate()?;
        if self.zoning.authoritative_enabled && self.zoning.timeout_secs == 0 {
            return Err(AnalysisError::Config {
                message: "zoning.timeout_secs must be at least 1".to_string(),
            });
        }
        if self.zoning.max_attempts == 0 {
            return Err(AnalysisError::Config {
                message: "zoning.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Year to evaluate age-based rules against.
    #[must_use]
    pub fn assessment_year(&self) -> i32 {
        self.as_of_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }
}

/// Recursively merges `overrides` into `base`. Nested tables merge key by
/// key; any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
