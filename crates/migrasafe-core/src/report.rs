//! Score report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::finding::{Finding, Severity};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Final decision for one analyzed migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Total score below the threshold
    Pass,

    /// Total score at or above the threshold - the migration is blocked
    Fail,
}

impl Verdict {
    /// FAIL iff `total_score >= threshold`. The boundary is inclusive: a
    /// migration scoring exactly at the threshold fails. A threshold of 0
    /// fails on any finding; a very large threshold never blocks.
    pub fn decide(total_score: u32, threshold: u32) -> Self {
        if total_score >= threshold {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Count and subtotal for one severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    /// Number of findings in this tier
    pub count: usize,

    /// Sum of points over findings in this tier
    pub subtotal: u32,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of findings
    pub total_findings: usize,

    /// Breakdown per severity tier
    pub critical: SeverityBreakdown,
    pub high: SeverityBreakdown,
    pub medium: SeverityBreakdown,
    pub low: SeverityBreakdown,
}

impl ReportSummary {
    fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self {
            total_findings: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            let tier = match finding.severity {
                Severity::Critical => &mut summary.critical,
                Severity::High => &mut summary.high,
                Severity::Medium => &mut summary.medium,
                Severity::Low => &mut summary.low,
            };
            tier.count += 1;
            tier.subtotal += finding.points;
        }

        summary
    }
}

/// Risk score report for one analyzed migration (report.json v1)
///
/// This is the stable output format consumed by renderers and CI wrappers.
/// Invariant: `total_score` equals the sum of points over `findings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Name of the analyzed input buffer (usually a file path)
    pub file: String,

    /// All findings, in source order
    pub findings: Vec<Finding>,

    /// Sum of points over all findings
    pub total_score: u32,

    /// Threshold the verdict was decided against
    pub threshold: u32,

    /// Final decision
    pub verdict: Verdict,

    /// Summary statistics
    pub summary: ReportSummary,
}

impl ScoreReport {
    /// Build a report from findings and decide the verdict
    pub fn build(file: impl Into<String>, findings: Vec<Finding>, threshold: u32) -> Self {
        let total_score = findings.iter().map(|f| f.points).sum();
        let summary = ReportSummary::from_findings(&findings);

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            file: file.into(),
            findings,
            total_score,
            threshold,
            verdict: Verdict::decide(total_score, threshold),
            summary,
        }
    }

    /// Check if the migration was blocked
    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Fail
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

/// Coarse risk label for a total score, used in human-readable output
pub fn risk_label(score: u32) -> Severity {
    if score >= 50 {
        Severity::Critical
    } else if score >= 30 {
        Severity::High
    } else if score >= 15 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
