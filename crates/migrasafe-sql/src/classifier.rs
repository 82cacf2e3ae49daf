//! Statement classifier
//!
//! Turns one raw statement into a normalized operation descriptor by
//! structural keyword recognition: identify the leading verb sequence, then
//! scan the remainder for the clause markers the rule set cares about.
//!
//! Classification never fails. Anything ambiguous or unrecognized degrades
//! to `OperationKind::Other` with empty modifiers. Table and column names
//! are extracted best-effort; a missing name never blocks classification of
//! kind and modifiers.

use crate::tokens::{tokenize, Token};
use migrasafe_core::{ClassifiedStatement, Modifier, OperationKind, RawStatement};
use std::collections::BTreeSet;

/// Classify a raw statement fragment.
pub fn classify(raw: &RawStatement) -> ClassifiedStatement {
    let tokens = tokenize(&raw.text);

    let classified = if tokens.get(0).is_some_and(|t| t.is_kw("ALTER"))
        && tokens.get(1).is_some_and(|t| t.is_kw("TABLE"))
    {
        classify_alter_table(&tokens, raw)
    } else if tokens.get(0).is_some_and(|t| t.is_kw("CREATE")) {
        classify_create(&tokens, raw)
    } else if tokens.get(0).is_some_and(|t| t.is_kw("DROP"))
        && tokens.get(1).is_some_and(|t| t.is_kw("TABLE"))
    {
        classify_drop_table(&tokens, raw)
    } else {
        None
    };

    classified.unwrap_or_else(|| {
        tracing::trace!(span = %raw.span, "statement did not match a known DDL shape");
        ClassifiedStatement::other(raw.text.clone(), raw.span)
    })
}

fn classify_alter_table(tokens: &[Token], raw: &RawStatement) -> Option<ClassifiedStatement> {
    let mut i = 2;

    // ALTER TABLE [IF EXISTS] [ONLY] <name>
    if tokens.get(i).is_some_and(|t| t.is_kw("IF")) && tokens.get(i + 1).is_some_and(|t| t.is_kw("EXISTS")) {
        i += 2;
    }
    if tokens.get(i).is_some_and(|t| t.is_kw("ONLY")) {
        i += 1;
    }
    let (table, mut i) = read_object_name(tokens, i);

    let action = tokens.get(i)?;
    i += 1;

    if action.is_kw("ADD") {
        classify_alter_add(tokens, i, table, raw)
    } else if action.is_kw("DROP") && tokens.get(i).is_some_and(|t| t.is_kw("COLUMN")) {
        i += 1;
        if tokens.get(i).is_some_and(|t| t.is_kw("IF")) && tokens.get(i + 1).is_some_and(|t| t.is_kw("EXISTS")) {
            i += 2;
        }
        let columns = single_column(tokens.get(i));
        Some(build(OperationKind::DropColumn, table, columns, BTreeSet::new(), raw))
    } else if action.is_kw("RENAME") && tokens.get(i).is_some_and(|t| t.is_kw("COLUMN")) {
        i += 1;
        let mut columns = single_column(tokens.get(i));
        // RENAME COLUMN <old> TO <new>: both names are involved
        if tokens.get(i + 1).is_some_and(|t| t.is_kw("TO")) {
            columns.extend(single_column(tokens.get(i + 2)));
        }
        Some(build(OperationKind::RenameColumn, table, columns, BTreeSet::new(), raw))
    } else if action.is_kw("ALTER") {
        if tokens.get(i).is_some_and(|t| t.is_kw("COLUMN")) {
            i += 1;
        }
        let columns = single_column(tokens.get(i));
        // ALTER COLUMN <name> [SET DATA] TYPE <type>
        let has_type = tokens[i..].iter().any(|t| t.is_kw("TYPE"));
        if has_type {
            Some(build(OperationKind::AlterColumnType, table, columns, BTreeSet::new(), raw))
        } else {
            None
        }
    } else {
        None
    }
}

/// ALTER TABLE ... ADD: a column definition, a named constraint, or an
/// inline UNIQUE constraint.
fn classify_alter_add(
    tokens: &[Token],
    mut i: usize,
    table: String,
    raw: &RawStatement,
) -> Option<ClassifiedStatement> {
    if tokens.get(i).is_some_and(|t| t.is_kw("CONSTRAINT")) {
        // ADD CONSTRAINT <name> UNIQUE (...) - only the UNIQUE form is a
        // shape the rule set recognizes; FOREIGN KEY, CHECK etc. stay Other.
        if tokens[i..].iter().any(|t| t.is_kw("UNIQUE")) {
            let columns = parenthesized_columns(&tokens[i..]);
            let modifiers = scan_modifiers(&tokens[i..]);
            return Some(build(OperationKind::AddUniqueConstraint, table, columns, modifiers, raw));
        }
        return None;
    }

    if tokens.get(i).is_some_and(|t| t.is_kw("UNIQUE")) {
        let columns = parenthesized_columns(&tokens[i..]);
        let modifiers = scan_modifiers(&tokens[i..]);
        return Some(build(OperationKind::AddUniqueConstraint, table, columns, modifiers, raw));
    }

    // ADD [COLUMN] [IF NOT EXISTS] <name> <type> <constraints...>
    if tokens.get(i).is_some_and(|t| t.is_kw("COLUMN")) {
        i += 1;
    }
    if tokens.get(i).is_some_and(|t| t.is_kw("IF"))
        && tokens.get(i + 1).is_some_and(|t| t.is_kw("NOT"))
        && tokens.get(i + 2).is_some_and(|t| t.is_kw("EXISTS"))
    {
        i += 3;
    }
    let columns = single_column(tokens.get(i));
    let modifiers = scan_modifiers(&tokens[i..]);
    Some(build(OperationKind::AddColumn, table, columns, modifiers, raw))
}

fn classify_create(tokens: &[Token], raw: &RawStatement) -> Option<ClassifiedStatement> {
    let mut i = 1;
    let mut modifiers = BTreeSet::new();

    if tokens.get(i).is_some_and(|t| t.is_kw("UNIQUE")) {
        modifiers.insert(Modifier::Unique);
        i += 1;
    }
    if !tokens.get(i).is_some_and(|t| t.is_kw("INDEX")) {
        // CREATE TABLE, CREATE VIEW, ... are not shapes the rule set targets
        return None;
    }
    i += 1;

    if tokens.get(i).is_some_and(|t| t.is_kw("CONCURRENTLY")) {
        modifiers.insert(Modifier::Concurrently);
        i += 1;
    }
    if tokens.get(i).is_some_and(|t| t.is_kw("IF"))
        && tokens.get(i + 1).is_some_and(|t| t.is_kw("NOT"))
        && tokens.get(i + 2).is_some_and(|t| t.is_kw("EXISTS"))
    {
        i += 3;
    }

    // Optional index name, then ON <table> (cols...)
    let table = match tokens[i..].iter().position(|t| t.is_kw("ON")) {
        Some(on_offset) => read_object_name(tokens, i + on_offset + 1).0,
        None => String::new(),
    };
    let columns = parenthesized_columns(&tokens[i..]);

    Some(build(OperationKind::CreateIndex, table, columns, modifiers, raw))
}

fn classify_drop_table(tokens: &[Token], raw: &RawStatement) -> Option<ClassifiedStatement> {
    let mut i = 2;
    if tokens.get(i).is_some_and(|t| t.is_kw("IF")) && tokens.get(i + 1).is_some_and(|t| t.is_kw("EXISTS")) {
        i += 2;
    }
    let (table, _) = read_object_name(tokens, i);
    Some(build(OperationKind::DropTable, table, BTreeSet::new(), BTreeSet::new(), raw))
}

fn build(
    kind: OperationKind,
    table: String,
    columns: BTreeSet<String>,
    modifiers: BTreeSet<Modifier>,
    raw: &RawStatement,
) -> ClassifiedStatement {
    ClassifiedStatement {
        kind,
        table,
        columns,
        modifiers,
        text: raw.text.clone(),
        span: raw.span,
    }
}

/// Read a possibly schema-qualified object name (`schema.table`) starting
/// at `i`. Returns the joined name (empty when absent) and the next index.
fn read_object_name(tokens: &[Token], mut i: usize) -> (String, usize) {
    let mut parts = Vec::new();

    while let Some(ident) = tokens.get(i).and_then(|t| t.ident()) {
        parts.push(ident.to_string());
        i += 1;
        if tokens.get(i).is_some_and(|t| t.is_symbol('.')) {
            i += 1;
        } else {
            break;
        }
    }

    (parts.join("."), i)
}

fn single_column(token: Option<&Token>) -> BTreeSet<String> {
    token
        .and_then(|t| t.ident())
        .map(|name| BTreeSet::from([name.to_string()]))
        .unwrap_or_default()
}

/// Collect identifiers from the first parenthesized list in the slice.
/// Best-effort: function calls in expression indexes contribute their
/// arguments, not the function name.
fn parenthesized_columns(tokens: &[Token]) -> BTreeSet<String> {
    let mut columns = BTreeSet::new();
    let mut depth = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                break;
            }
        } else if depth > 0 {
            let is_call = tokens.get(i + 1).is_some_and(|t| t.is_symbol('('));
            if let Some(ident) = token.ident() {
                if !is_call && !ident.chars().all(|c| c.is_ascii_digit()) {
                    columns.insert(ident.to_string());
                }
            }
        }
    }

    columns
}

/// Scan a clause remainder for the modifier keywords the rule set cares
/// about. NOT NULL must appear as the adjacent keyword pair.
fn scan_modifiers(tokens: &[Token]) -> BTreeSet<Modifier> {
    let mut modifiers = BTreeSet::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.is_kw("NOT") && tokens.get(i + 1).is_some_and(|t| t.is_kw("NULL")) {
            modifiers.insert(Modifier::NotNull);
        } else if token.is_kw("DEFAULT") {
            modifiers.insert(Modifier::Default);
        } else if token.is_kw("UNIQUE") {
            modifiers.insert(Modifier::Unique);
        } else if token.is_kw("CONCURRENTLY") {
            modifiers.insert(Modifier::Concurrently);
        }
    }

    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrasafe_core::SourceSpan;
    use pretty_assertions::assert_eq;

    fn classify_text(sql: &str) -> ClassifiedStatement {
        classify(&RawStatement::new(sql, SourceSpan::line(1)))
    }

    #[test]
    fn add_column_not_null() {
        let stmt = classify_text("ALTER TABLE users ADD COLUMN email varchar(255) NOT NULL");
        assert_eq!(stmt.kind, OperationKind::AddColumn);
        assert_eq!(stmt.table, "users");
        assert!(stmt.columns.contains("email"));
        assert!(stmt.has_modifier(Modifier::NotNull));
        assert!(!stmt.has_modifier(Modifier::Default));
    }

    #[test]
    fn add_column_not_null_with_default() {
        let stmt = classify_text("ALTER TABLE users ADD COLUMN email varchar(255) NOT NULL DEFAULT ''");
        assert!(stmt.has_modifier(Modifier::NotNull));
        assert!(stmt.has_modifier(Modifier::Default));
    }

    #[test]
    fn add_column_without_column_keyword() {
        let stmt = classify_text("ALTER TABLE users ADD nickname text NOT NULL");
        assert_eq!(stmt.kind, OperationKind::AddColumn);
        assert!(stmt.columns.contains("nickname"));
        assert!(stmt.has_modifier(Modifier::NotNull));
    }

    #[test]
    fn matching_is_case_insensitive_and_whitespace_tolerant() {
        let stmt = classify_text("alter   table\n  Users\n  add Column\n  email text\n  not\tnull");
        assert_eq!(stmt.kind, OperationKind::AddColumn);
        assert_eq!(stmt.table, "Users");
        assert!(stmt.has_modifier(Modifier::NotNull));
    }

    #[test]
    fn default_inside_literal_is_not_a_modifier() {
        let stmt = classify_text("ALTER TABLE t ADD COLUMN c text NOT NULL -- DEFAULT soon");
        assert!(stmt.has_modifier(Modifier::NotNull));
        assert!(!stmt.has_modifier(Modifier::Default));

        let stmt = classify_text("ALTER TABLE t ADD COLUMN c text DEFAULT 'NOT NULL'");
        assert!(stmt.has_modifier(Modifier::Default));
        assert!(!stmt.has_modifier(Modifier::NotNull));
    }

    #[test]
    fn drop_column() {
        let stmt = classify_text("ALTER TABLE users DROP COLUMN legacy_field");
        assert_eq!(stmt.kind, OperationKind::DropColumn);
        assert_eq!(stmt.table, "users");
        assert!(stmt.columns.contains("legacy_field"));
    }

    #[test]
    fn drop_column_if_exists() {
        let stmt = classify_text("ALTER TABLE users DROP COLUMN IF EXISTS legacy_field");
        assert_eq!(stmt.kind, OperationKind::DropColumn);
        assert!(stmt.columns.contains("legacy_field"));
    }

    #[test]
    fn rename_column_tracks_both_names() {
        let stmt = classify_text("ALTER TABLE users RENAME COLUMN old_name TO new_name");
        assert_eq!(stmt.kind, OperationKind::RenameColumn);
        assert!(stmt.columns.contains("old_name"));
        assert!(stmt.columns.contains("new_name"));
    }

    #[test]
    fn rename_table_is_not_rename_column() {
        let stmt = classify_text("ALTER TABLE users RENAME TO members");
        assert_eq!(stmt.kind, OperationKind::Other);
    }

    #[test]
    fn alter_column_type_long_form() {
        let stmt = classify_text("ALTER TABLE users ALTER COLUMN age SET DATA TYPE bigint");
        assert_eq!(stmt.kind, OperationKind::AlterColumnType);
        assert!(stmt.columns.contains("age"));
    }

    #[test]
    fn alter_column_type_short_form() {
        let stmt = classify_text("ALTER TABLE users ALTER COLUMN age TYPE bigint");
        assert_eq!(stmt.kind, OperationKind::AlterColumnType);
    }

    #[test]
    fn alter_column_set_not_null_is_other() {
        // A different risk profile than a type change; not a recognized shape
        let stmt = classify_text("ALTER TABLE users ALTER COLUMN age SET NOT NULL");
        assert_eq!(stmt.kind, OperationKind::Other);
    }

    #[test]
    fn create_index() {
        let stmt = classify_text("CREATE INDEX idx_users_email ON users(email)");
        assert_eq!(stmt.kind, OperationKind::CreateIndex);
        assert_eq!(stmt.table, "users");
        assert!(stmt.columns.contains("email"));
        assert!(!stmt.has_modifier(Modifier::Concurrently));
    }

    #[test]
    fn create_index_concurrently() {
        let stmt = classify_text("CREATE INDEX CONCURRENTLY idx_users_email ON users(email)");
        assert_eq!(stmt.kind, OperationKind::CreateIndex);
        assert!(stmt.has_modifier(Modifier::Concurrently));
    }

    #[test]
    fn create_unique_index() {
        let stmt = classify_text("CREATE UNIQUE INDEX idx_uniq ON users (email, tenant_id)");
        assert_eq!(stmt.kind, OperationKind::CreateIndex);
        assert!(stmt.has_modifier(Modifier::Unique));
        assert!(stmt.columns.contains("email"));
        assert!(stmt.columns.contains("tenant_id"));
    }

    #[test]
    fn create_table_is_other() {
        let stmt = classify_text("CREATE TABLE audit_log (id bigint NOT NULL)");
        assert_eq!(stmt.kind, OperationKind::Other);
        assert!(stmt.modifiers.is_empty());
    }

    #[test]
    fn drop_table() {
        let stmt = classify_text("DROP TABLE sessions");
        assert_eq!(stmt.kind, OperationKind::DropTable);
        assert_eq!(stmt.table, "sessions");
    }

    #[test]
    fn drop_table_if_exists() {
        let stmt = classify_text("DROP TABLE IF EXISTS sessions");
        assert_eq!(stmt.kind, OperationKind::DropTable);
        assert_eq!(stmt.table, "sessions");
    }

    #[test]
    fn add_named_unique_constraint() {
        let stmt = classify_text("ALTER TABLE users ADD CONSTRAINT uq_email UNIQUE (email)");
        assert_eq!(stmt.kind, OperationKind::AddUniqueConstraint);
        assert!(stmt.columns.contains("email"));
    }

    #[test]
    fn add_inline_unique_constraint() {
        let stmt = classify_text("ALTER TABLE users ADD UNIQUE (email)");
        assert_eq!(stmt.kind, OperationKind::AddUniqueConstraint);
    }

    #[test]
    fn add_foreign_key_constraint_is_other() {
        let stmt = classify_text(
            "ALTER TABLE orders ADD CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id)",
        );
        assert_eq!(stmt.kind, OperationKind::Other);
    }

    #[test]
    fn schema_qualified_table_name() {
        let stmt = classify_text("DROP TABLE public.sessions");
        assert_eq!(stmt.table, "public.sessions");

        let stmt = classify_text("ALTER TABLE \"public\".\"users\" DROP COLUMN old");
        assert_eq!(stmt.kind, OperationKind::DropColumn);
        assert_eq!(stmt.table, "public.users");
    }

    #[test]
    fn dml_and_garbage_degrade_to_other() {
        for sql in [
            "SELECT 1",
            "INSERT INTO logs VALUES (1)",
            "UPDATE t SET a = 1",
            "GRANT ALL ON t TO role",
            ");;;(((",
            "ALTER",
            "ALTER TABLE",
            "DROP",
        ] {
            let stmt = classify_text(sql);
            assert_eq!(stmt.kind, OperationKind::Other, "input: {sql}");
            assert!(stmt.modifiers.is_empty(), "input: {sql}");
        }
    }

    #[test]
    fn missing_names_do_not_block_classification() {
        // Truncated but the verb sequence is unambiguous
        let stmt = classify_text("DROP TABLE");
        assert_eq!(stmt.kind, OperationKind::DropTable);
        assert_eq!(stmt.table, "");
    }

    #[test]
    fn expression_index_collects_argument_idents() {
        let stmt = classify_text("CREATE INDEX idx ON users (lower(email))");
        assert_eq!(stmt.kind, OperationKind::CreateIndex);
        assert!(stmt.columns.contains("email"));
        assert!(!stmt.columns.contains("lower"));
    }
}
