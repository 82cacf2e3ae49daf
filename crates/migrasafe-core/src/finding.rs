//! Findings and severity tiers
//!
//! IMPORTANT: Rule ids carried in findings are versioned and stable.
//! NEVER rename or reuse ids - they are part of the public API.
//! Add new rules with new ids only.

use crate::statement::SourceSpan;
use serde::{Deserialize, Serialize};

/// Risk severity tier attached to a rule, independent of its point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Low risk - informational
    Low,

    /// Medium risk - should be reviewed
    Medium,

    /// High risk - likely to cause an incident on a busy table
    High,

    /// Critical risk - data loss or guaranteed failure on non-empty tables
    Critical,
}

impl Severity {
    /// Get the severity as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One triggered rule instance tied to a specific source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable rule id (e.g. "MS001")
    pub rule_id: String,

    /// Severity tier of the triggering rule
    pub severity: Severity,

    /// Points this finding contributes to the total score
    pub points: u32,

    /// Source location of the matched statement or operation
    pub span: SourceSpan,

    /// Human-readable description of the risk
    pub message: String,

    /// Matched source text, truncated for display
    pub snippet: String,

    /// Suggested safe alternative
    pub remediation: String,
}

impl Finding {
    /// Maximum snippet length carried in a finding
    pub const SNIPPET_LIMIT: usize = 80;

    /// Truncate matched source text to the snippet limit, on a char boundary
    pub fn snippet_of(text: &str) -> String {
        let trimmed = text.trim();
        match trimmed.char_indices().nth(Self::SNIPPET_LIMIT) {
            Some((idx, _)) => trimmed[..idx].to_string(),
            None => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn severity_stability() {
        assert_eq!(Severity::Critical.as_str(), "CRITICAL");
        assert_eq!(Severity::Low.as_str(), "LOW");
    }

    #[test]
    fn snippet_truncation() {
        let long = "x".repeat(200);
        assert_eq!(Finding::snippet_of(&long).len(), Finding::SNIPPET_LIMIT);
        assert_eq!(Finding::snippet_of("  DROP TABLE t  "), "DROP TABLE t");
    }

    #[test]
    fn finding_serialization() {
        let finding = Finding {
            rule_id: "MS005".to_string(),
            severity: Severity::Critical,
            points: 50,
            span: SourceSpan::line(2),
            message: "DROP TABLE causes irreversible data loss".to_string(),
            snippet: "DROP TABLE sessions".to_string(),
            remediation: "Rename first".to_string(),
        };

        let json = serde_json::to_string(&finding).unwrap();
        assert!(json.contains("MS005"));
        assert!(json.contains("CRITICAL"));
    }
}
