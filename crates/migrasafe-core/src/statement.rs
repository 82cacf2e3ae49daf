//! Statement model: raw fragments, classified operations, declarative operations
//!
//! These types flow strictly downstream through the pipeline. Each stage
//! produces an immutable value consumed by the next; nothing is mutated in
//! place after construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A 1-indexed line range in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// First line of the fragment (1-indexed)
    pub start_line: usize,

    /// Last line of the fragment (1-indexed, inclusive)
    pub end_line: usize,
}

impl SourceSpan {
    /// Create a span covering a line range
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Create a span covering a single line
    pub fn line(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "line {}", self.start_line)
        } else {
            write!(f, "lines {}-{}", self.start_line, self.end_line)
        }
    }
}

/// One statement fragment produced by the splitter, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// Statement text with the terminator stripped
    pub text: String,

    /// Source location of the fragment
    pub span: SourceSpan,
}

impl RawStatement {
    pub fn new(text: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// Schema-altering intent of a statement (v1)
///
/// This enumeration is CLOSED and STABLE: the rule registry matches on these
/// variants, so adding one requires reviewing every rule predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// ALTER TABLE ... ADD [COLUMN]
    AddColumn,

    /// ALTER TABLE ... DROP COLUMN
    DropColumn,

    /// CREATE [UNIQUE] INDEX
    CreateIndex,

    /// ALTER TABLE ... RENAME COLUMN ... TO
    RenameColumn,

    /// DROP TABLE
    DropTable,

    /// ALTER TABLE ... ALTER COLUMN ... [SET DATA] TYPE
    AlterColumnType,

    /// ALTER TABLE ... ADD [CONSTRAINT ...] UNIQUE
    AddUniqueConstraint,

    /// Anything the classifier does not recognize. The safe default:
    /// classification degrades here, it never fails.
    Other,
}

impl OperationKind {
    /// Get the operation kind as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddColumn => "add_column",
            Self::DropColumn => "drop_column",
            Self::CreateIndex => "create_index",
            Self::RenameColumn => "rename_column",
            Self::DropTable => "drop_table",
            Self::AlterColumnType => "alter_column_type",
            Self::AddUniqueConstraint => "add_unique_constraint",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clause markers the rule set cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modifier {
    /// NOT NULL constraint present
    NotNull,

    /// DEFAULT clause present
    Default,

    /// CONCURRENTLY keyword present (index builds)
    Concurrently,

    /// UNIQUE keyword present
    Unique,
}

/// Normalized operation descriptor for one raw statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedStatement {
    /// Recognized operation kind, `Other` when no DDL shape matched
    pub kind: OperationKind,

    /// Target table name, best-effort (empty when not parseable)
    pub table: String,

    /// Column names involved, best-effort
    pub columns: BTreeSet<String>,

    /// Clause markers found in the statement
    pub modifiers: BTreeSet<Modifier>,

    /// Statement text with the terminator stripped
    pub text: String,

    /// Source location of the originating fragment
    pub span: SourceSpan,
}

impl ClassifiedStatement {
    /// Create an unrecognized statement descriptor
    pub fn other(text: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            kind: OperationKind::Other,
            table: String::new(),
            columns: BTreeSet::new(),
            modifiers: BTreeSet::new(),
            text: text.into(),
            span,
        }
    }

    /// Check whether a modifier is present
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// A named operation extracted from a framework-style declarative migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarativeOperation {
    /// Operation name as written in the source (e.g. "RunPython")
    pub name: String,

    /// Whether a reverse procedure argument was supplied
    pub has_reverse: bool,

    /// Operation text as written, truncated for reporting
    pub text: String,

    /// Source location of the operation declaration
    pub span: SourceSpan,
}
