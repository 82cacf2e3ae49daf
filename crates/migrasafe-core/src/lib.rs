//! MigraSafe Core
//!
//! Core domain model with stable, versioned types.
//! Never rename rule ids - they are part of the public API.

pub mod config;
pub mod finding;
pub mod report;
pub mod statement;

pub use config::{AnalyzerConfig, ConfigError};
pub use finding::{Finding, Severity};
pub use report::{risk_label, ReportSummary, ReportVersion, ScoreReport, SeverityBreakdown, Verdict};
pub use statement::{
    ClassifiedStatement, DeclarativeOperation, Modifier, OperationKind, RawStatement, SourceSpan,
};
