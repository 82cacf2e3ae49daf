//! MigraSafe declarative front-end
//!
//! Extracts named operations from framework-style declarative migration
//! files (Django migration modules). This is a narrow structural scanner
//! over the operation-declaration syntax, not a language parser: it
//! recognizes exactly the call shape the rule set targets and skips
//! everything else.

pub mod extractor;

pub use extractor::{extract, RUN_PYTHON};
