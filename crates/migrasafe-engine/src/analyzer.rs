//! Per-file analysis pipeline
//!
//! Splitter -> Classifier (or Declarative Extractor) -> Rule Registry ->
//! ScoreReport. Each stage produces an immutable value consumed by the
//! next; the whole pipeline is a bounded, synchronous computation over text
//! already in memory.

use migrasafe_core::{AnalyzerConfig, ConfigError, ScoreReport};

use crate::rules::RuleRegistry;

/// Input dialect, supplied by the caller. The SQL classifier and the
/// declarative extractor are disjoint pipelines; dialect is never
/// auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Raw SQL migration text
    Sql,

    /// Framework-style declarative migration module
    Declarative,
}

/// Migration risk analyzer holding the rule registry and configuration.
///
/// Holds no cross-file state: `analyze` takes `&self` and independent files
/// may be analyzed concurrently.
pub struct Analyzer {
    registry: RuleRegistry,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer with the baseline rule set.
    ///
    /// Fails if the configuration disables a rule id the registry does not
    /// know; configuration misuse is reported here, never as a finding.
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        let registry = RuleRegistry::baseline();
        config.validate_rule_ids(registry.rule_ids())?;
        Ok(Self { registry, config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Analyze one named input buffer and produce its score report.
    ///
    /// Never fails: malformed SQL degrades to unrecognized statements and
    /// unrecognized declarative shapes are skipped, so the analysis always
    /// completes with whatever did classify.
    pub fn analyze(&self, file: &str, source: &str, dialect: Dialect) -> ScoreReport {
        let findings = match dialect {
            Dialect::Sql => {
                let statements = migrasafe_sql::classify_source(source);
                tracing::debug!(file, statements = statements.len(), "classified sql migration");
                self.registry.evaluate(&self.config, &statements, &[])
            }
            Dialect::Declarative => {
                let operations = migrasafe_declarative::extract(source);
                tracing::debug!(file, operations = operations.len(), "extracted declarative operations");
                self.registry.evaluate(&self.config, &[], &operations)
            }
        };

        let report = ScoreReport::build(file, findings, self.config.threshold);
        tracing::debug!(
            file,
            score = report.total_score,
            verdict = %report.verdict,
            "analysis complete"
        );
        report
    }
}
