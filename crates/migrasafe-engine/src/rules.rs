//! Rule registry
//!
//! Rules are data, not objects: each rule is a record with a stable id, a
//! severity tier, a point value, and a pure predicate over either classified
//! SQL statements or declarative operations. The registry is populated at
//! startup and immutable thereafter.
//!
//! Evaluation is order-independent: every enabled rule is checked against
//! every eligible input, results are unioned, and findings are sorted by
//! source location so registration order never affects output.

use migrasafe_core::{
    AnalyzerConfig, ClassifiedStatement, DeclarativeOperation, Finding, Modifier, OperationKind,
    Severity,
};

/// Pure matching predicate, tagged by the input collection it applies to
#[derive(Clone, Copy)]
pub enum RulePredicate {
    /// Evaluated against every classified SQL statement
    Sql(fn(&ClassifiedStatement) -> bool),

    /// Evaluated against every extracted declarative operation
    Declarative(fn(&DeclarativeOperation) -> bool),
}

/// One risk rule definition
///
/// IMPORTANT: ids are stable and versioned. Never rename or reuse an id;
/// retire rules by removing them and add new behavior under a new id.
pub struct RuleDefinition {
    /// Stable rule id (MS0xx for SQL rules, MS1xx for declarative rules)
    pub id: &'static str,

    /// Severity tier, independent of the point value
    pub severity: Severity,

    /// Points contributed per triggered location
    pub points: u32,

    /// Human-readable description of the risk
    pub message: &'static str,

    /// Suggested safe alternative
    pub remediation: &'static str,

    /// Matching predicate
    pub predicate: RulePredicate,
}

impl RuleDefinition {
    /// Whether this rule belongs to the declarative-operation family, which
    /// is toggled as a group
    pub fn is_declarative(&self) -> bool {
        matches!(self.predicate, RulePredicate::Declarative(_))
    }
}

/// Append-only rule set, populated at startup and immutable thereafter
pub struct RuleRegistry {
    rules: Vec<RuleDefinition>,
}

impl RuleRegistry {
    /// The baseline rule set (MS001-MS007, MS101)
    pub fn baseline() -> Self {
        Self {
            rules: vec![
                RuleDefinition {
                    id: "MS001",
                    severity: Severity::Critical,
                    points: 40,
                    message: "ADD COLUMN with NOT NULL and no DEFAULT fails on non-empty tables",
                    remediation: "Add a DEFAULT value, or split: add nullable, backfill, then SET NOT NULL",
                    predicate: RulePredicate::Sql(|stmt| {
                        stmt.kind == OperationKind::AddColumn
                            && stmt.has_modifier(Modifier::NotNull)
                            && !stmt.has_modifier(Modifier::Default)
                    }),
                },
                RuleDefinition {
                    id: "MS002",
                    severity: Severity::High,
                    points: 30,
                    message: "DROP COLUMN is backward-incompatible; running code may still reference it",
                    remediation: "Expand-contract: stop reading the column, deploy, drop it in a later migration",
                    predicate: RulePredicate::Sql(|stmt| stmt.kind == OperationKind::DropColumn),
                },
                RuleDefinition {
                    id: "MS003",
                    severity: Severity::High,
                    points: 25,
                    message: "CREATE INDEX without CONCURRENTLY locks the table for writes",
                    remediation: "Use CREATE INDEX CONCURRENTLY to avoid blocking writes",
                    predicate: RulePredicate::Sql(|stmt| {
                        stmt.kind == OperationKind::CreateIndex
                            && !stmt.has_modifier(Modifier::Concurrently)
                    }),
                },
                RuleDefinition {
                    id: "MS004",
                    severity: Severity::High,
                    points: 30,
                    message: "RENAME COLUMN is backward-incompatible; old code uses the old name",
                    remediation: "Add a new column, copy data, update code, then drop the old column",
                    predicate: RulePredicate::Sql(|stmt| stmt.kind == OperationKind::RenameColumn),
                },
                RuleDefinition {
                    id: "MS005",
                    severity: Severity::Critical,
                    points: 50,
                    message: "DROP TABLE causes irreversible data loss",
                    remediation: "Ensure no service still uses the table; consider renaming it first",
                    predicate: RulePredicate::Sql(|stmt| stmt.kind == OperationKind::DropTable),
                },
                RuleDefinition {
                    id: "MS006",
                    severity: Severity::High,
                    points: 35,
                    message: "ALTER COLUMN TYPE may cause a full table rewrite and lock",
                    remediation: "Use expand-contract, or ensure the cast is safe (e.g. varchar to text)",
                    predicate: RulePredicate::Sql(|stmt| {
                        stmt.kind == OperationKind::AlterColumnType
                    }),
                },
                RuleDefinition {
                    id: "MS007",
                    severity: Severity::Medium,
                    points: 20,
                    message: "ADD UNIQUE constraint requires a full table scan and lock",
                    remediation: "Create a UNIQUE INDEX CONCURRENTLY first, then ADD CONSTRAINT USING INDEX",
                    predicate: RulePredicate::Sql(|stmt| {
                        stmt.kind == OperationKind::AddUniqueConstraint
                    }),
                },
                RuleDefinition {
                    id: "MS101",
                    severity: Severity::Medium,
                    points: 20,
                    message: "RunPython without a reverse function makes the migration irreversible",
                    remediation: "Add a reverse: RunPython(forward, reverse) or RunPython(forward, RunPython.noop)",
                    predicate: RulePredicate::Declarative(|op| {
                        op.name == migrasafe_declarative::RUN_PYTHON && !op.has_reverse
                    }),
                },
            ],
        }
    }

    /// All rule ids known to this registry
    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.id)
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Evaluate every enabled rule against every eligible input.
    ///
    /// Each (rule, matched location) pair emits exactly one finding; a
    /// statement may trigger any number of distinct rules. A disabled
    /// rule's predicate is never invoked. Findings come back sorted by
    /// source location, then rule id.
    pub fn evaluate(
        &self,
        config: &AnalyzerConfig,
        statements: &[ClassifiedStatement],
        operations: &[DeclarativeOperation],
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &self.rules {
            if config.is_rule_disabled(rule.id) {
                continue;
            }
            if rule.is_declarative() && !config.declarative_rules_enabled {
                continue;
            }

            match rule.predicate {
                RulePredicate::Sql(predicate) => {
                    for stmt in statements {
                        if predicate(stmt) {
                            findings.push(make_finding(rule, &stmt.text, stmt.span));
                        }
                    }
                }
                RulePredicate::Declarative(predicate) => {
                    for op in operations {
                        if predicate(op) {
                            findings.push(make_finding(rule, &op.text, op.span));
                        }
                    }
                }
            }
        }

        findings.sort_by(|a, b| a.span.cmp(&b.span).then_with(|| a.rule_id.cmp(&b.rule_id)));
        findings
    }
}

fn make_finding(rule: &RuleDefinition, text: &str, span: migrasafe_core::SourceSpan) -> Finding {
    Finding {
        rule_id: rule.id.to_string(),
        severity: rule.severity,
        points: rule.points,
        span,
        message: rule.message.to_string(),
        snippet: Finding::snippet_of(text),
        remediation: rule.remediation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrasafe_core::SourceSpan;
    use pretty_assertions::assert_eq;

    fn statements(sql: &str) -> Vec<ClassifiedStatement> {
        migrasafe_sql::classify_source(sql)
    }

    fn evaluate_sql(sql: &str) -> Vec<Finding> {
        RuleRegistry::baseline().evaluate(&AnalyzerConfig::default(), &statements(sql), &[])
    }

    #[test]
    fn baseline_rule_table() {
        let registry = RuleRegistry::baseline();
        let expected = [
            ("MS001", Severity::Critical, 40),
            ("MS002", Severity::High, 30),
            ("MS003", Severity::High, 25),
            ("MS004", Severity::High, 30),
            ("MS005", Severity::Critical, 50),
            ("MS006", Severity::High, 35),
            ("MS007", Severity::Medium, 20),
            ("MS101", Severity::Medium, 20),
        ];

        for (id, severity, points) in expected {
            let rule = registry.get(id).unwrap_or_else(|| panic!("missing rule {id}"));
            assert_eq!(rule.severity, severity, "{id}");
            assert_eq!(rule.points, points, "{id}");
        }
        assert_eq!(registry.rule_ids().count(), expected.len());
    }

    #[test]
    fn ms001_requires_missing_default() {
        let findings = evaluate_sql("ALTER TABLE users ADD COLUMN email varchar(255) NOT NULL;");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "MS001");
        assert_eq!(findings[0].points, 40);

        let findings =
            evaluate_sql("ALTER TABLE users ADD COLUMN email varchar(255) NOT NULL DEFAULT '';");
        assert!(findings.is_empty());
    }

    #[test]
    fn ms003_suppressed_by_concurrently() {
        let findings = evaluate_sql("CREATE INDEX idx_users_email ON users(email);");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "MS003");

        let findings = evaluate_sql("CREATE INDEX CONCURRENTLY idx_users_email ON users(email);");
        assert!(findings.is_empty());
    }

    #[test]
    fn one_finding_per_rule_per_statement() {
        let findings = evaluate_sql("ALTER TABLE t DROP COLUMN a;\nALTER TABLE t DROP COLUMN b;");
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.rule_id == "MS002"));
        assert_eq!(findings[0].span, SourceSpan::line(1));
        assert_eq!(findings[1].span, SourceSpan::line(2));
    }

    #[test]
    fn findings_are_sorted_by_location() {
        let findings = evaluate_sql(
            "CREATE INDEX i ON t(c);\nDROP TABLE t;\nALTER TABLE u DROP COLUMN x;",
        );
        let order: Vec<_> = findings.iter().map(|f| f.span.start_line).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn disabled_rule_is_never_invoked() {
        let mut config = AnalyzerConfig::default();
        config.disabled_rules.insert("MS005".to_string());

        let registry = RuleRegistry::baseline();
        let findings = registry.evaluate(&config, &statements("DROP TABLE t;"), &[]);
        assert!(findings.is_empty());
    }

    #[test]
    fn declarative_rules_toggle_as_a_group() {
        let ops = migrasafe_declarative::extract("migrations.RunPython(forward)");
        let registry = RuleRegistry::baseline();

        let enabled = AnalyzerConfig::default();
        let findings = registry.evaluate(&enabled, &[], &ops);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "MS101");

        let disabled = AnalyzerConfig {
            declarative_rules_enabled: false,
            ..AnalyzerConfig::default()
        };
        assert!(registry.evaluate(&disabled, &[], &ops).is_empty());
    }

    #[test]
    fn ms101_not_triggered_when_reverse_present() {
        let ops = migrasafe_declarative::extract("migrations.RunPython(forward, backward)");
        let registry = RuleRegistry::baseline();
        assert!(registry.evaluate(&AnalyzerConfig::default(), &[], &ops).is_empty());
    }

    #[test]
    fn finding_carries_snippet_and_remediation() {
        let findings = evaluate_sql("DROP TABLE sessions;");
        assert_eq!(findings[0].snippet, "DROP TABLE sessions");
        assert!(findings[0].remediation.contains("renaming"));
    }
}
