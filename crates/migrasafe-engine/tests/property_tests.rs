use migrasafe_core::{AnalyzerConfig, Verdict};
use migrasafe_engine::{Analyzer, Dialect, RuleRegistry};
use proptest::prelude::*;

fn analyzer() -> Analyzer {
    Analyzer::new(AnalyzerConfig::default()).unwrap()
}

fn analyzer_with_all_rules_disabled() -> Analyzer {
    let registry = RuleRegistry::baseline();
    let config = AnalyzerConfig {
        disabled_rules: registry.rule_ids().map(String::from).collect(),
        ..AnalyzerConfig::default()
    };
    Analyzer::new(config).unwrap()
}

proptest! {
    #[test]
    fn never_crashes_on_arbitrary_sql(source in ".{0,500}") {
        let report = analyzer().analyze("fuzz.sql", &source, Dialect::Sql);
        prop_assert!(report.total_score < u32::MAX);
    }

    #[test]
    fn never_crashes_on_arbitrary_declarative(source in ".{0,500}") {
        let report = analyzer().analyze("fuzz.py", &source, Dialect::Declarative);
        prop_assert!(report.total_score < u32::MAX);
    }

    #[test]
    fn never_crashes_on_sql_like_fragments(
        parts in prop::collection::vec(
            prop::sample::select(vec![
                "ALTER TABLE t ", "ADD COLUMN c INT ", "NOT NULL", " DEFAULT 'x'",
                "DROP ", "TABLE ", "CREATE INDEX ", "CONCURRENTLY ", "ON t(c)",
                ";", "'unterminated", "-- comment;", "/* block", "$$ body", "\n",
            ]),
            0..12,
        )
    ) {
        let source = parts.concat();
        let report = analyzer().analyze("fuzz.sql", &source, Dialect::Sql);
        prop_assert!(report.total_score < u32::MAX);
    }

    #[test]
    fn total_score_equals_sum_of_finding_points(
        statements in prop::collection::vec(
            prop::sample::select(vec![
                "ALTER TABLE t ADD COLUMN c INT NOT NULL",
                "ALTER TABLE t ADD COLUMN c INT NOT NULL DEFAULT 0",
                "ALTER TABLE t DROP COLUMN c",
                "ALTER TABLE t RENAME COLUMN a TO b",
                "ALTER TABLE t ALTER COLUMN c TYPE bigint",
                "ALTER TABLE t ADD CONSTRAINT uq UNIQUE (c)",
                "CREATE INDEX i ON t(c)",
                "CREATE INDEX CONCURRENTLY i ON t(c)",
                "DROP TABLE t",
                "SELECT 1",
            ]),
            1..8,
        )
    ) {
        let source = statements.join(";\n");
        let report = analyzer().analyze("m.sql", &source, Dialect::Sql);

        let sum: u32 = report.findings.iter().map(|f| f.points).sum();
        prop_assert_eq!(report.total_score, sum);
        prop_assert!(report.findings.iter().all(|f| f.points > 0));
    }

    #[test]
    fn disabling_all_rules_always_passes(source in ".{0,300}") {
        let report = analyzer_with_all_rules_disabled().analyze("m.sql", &source, Dialect::Sql);
        prop_assert_eq!(report.total_score, 0);
        prop_assert!(report.findings.is_empty());
        prop_assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn analysis_is_deterministic(source in ".{0,300}") {
        let analyzer = analyzer();
        let first = analyzer.analyze("m.sql", &source, Dialect::Sql);
        let second = analyzer.analyze("m.sql", &source, Dialect::Sql);
        prop_assert_eq!(first.findings, second.findings);
        prop_assert_eq!(first.verdict, second.verdict);
    }

    #[test]
    fn findings_are_ordered_by_source_location(
        statements in prop::collection::vec(
            prop::sample::select(vec![
                "DROP TABLE t",
                "CREATE INDEX i ON t(c)",
                "ALTER TABLE t DROP COLUMN c",
            ]),
            1..6,
        )
    ) {
        let source = statements.join(";\n");
        let report = analyzer().analyze("m.sql", &source, Dialect::Sql);
        let lines: Vec<_> = report.findings.iter().map(|f| f.span.start_line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        prop_assert_eq!(lines, sorted);
    }
}
