//! MigraSafe engine - Core business logic
//!
//! This crate implements the risk scoring pipeline:
//! - Rule registry and evaluation
//! - Per-file analysis (split, classify, evaluate, score)
//!
//! The pipeline is a pure transformation over in-memory text: no I/O, no
//! shared mutable state. Callers may analyze independent files in parallel
//! with no coordination beyond collecting each file's report.

pub mod analyzer;
pub mod rules;

pub use analyzer::{Analyzer, Dialect};
pub use rules::{RuleDefinition, RulePredicate, RuleRegistry};
