//! Configuration schema (migrasafe.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_threshold() -> u32 {
    30
}

fn default_declarative_enabled() -> bool {
    true
}

/// Analyzer configuration supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Block the migration when the total score reaches this value
    /// (inclusive). 0 fails on any finding; a very large value never blocks.
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Rule ids that must never be evaluated
    #[serde(default)]
    pub disabled_rules: BTreeSet<String>,

    /// Group toggle for the declarative-operation rule family (MS1xx)
    #[serde(default = "default_declarative_enabled")]
    pub declarative_rules_enabled: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            disabled_rules: BTreeSet::new(),
            declarative_rules_enabled: default_declarative_enabled(),
        }
    }
}

impl AnalyzerConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Check if a rule id has been disabled
    pub fn is_rule_disabled(&self, rule_id: &str) -> bool {
        self.disabled_rules.contains(rule_id)
    }

    /// Validate `disabled_rules` against the set of ids the registry knows.
    ///
    /// An unknown id is configuration misuse, reported as a distinct error
    /// and never conflated with an analysis finding.
    pub fn validate_rule_ids<'a>(
        &self,
        known_ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ConfigError> {
        let known: BTreeSet<&str> = known_ids.into_iter().collect();

        for id in &self.disabled_rules {
            if !known.contains(id.as_str()) {
                return Err(ConfigError::UnknownRuleId(id.clone()));
            }
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown rule id in disabled_rules: {0}")]
    UnknownRuleId(String),
}
