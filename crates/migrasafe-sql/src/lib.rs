//! MigraSafe SQL front-end
//!
//! Lexical splitting and structural classification of raw migration SQL.
//! This crate deliberately does not implement a SQL grammar: it recognizes
//! the small, fixed set of DDL shapes the rule set cares about and degrades
//! everything else to an unrecognized statement.

pub mod classifier;
pub mod splitter;
pub mod tokens;

pub use classifier::classify;
pub use splitter::split;

use migrasafe_core::ClassifiedStatement;

/// Split migration source and classify every statement, in source order.
pub fn classify_source(source: &str) -> Vec<ClassifiedStatement> {
    splitter::split(source)
        .iter()
        .map(classifier::classify)
        .collect()
}
