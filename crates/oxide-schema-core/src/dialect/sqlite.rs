//! SQLite capability policy.

use super::{baseline_supported, Dialect};
use crate::change::Change;
use crate::model::{Index, Table};
use crate::names::NameMatch;

/// Prefix SQLite gives the indexes it creates for UNIQUE and PRIMARY KEY
/// constraints.
const AUTOINDEX_PREFIX: &str = "sqlite_autoindex_";

/// SQLite: `ALTER TABLE` can append columns, drop unconstrained columns
/// and nothing else. Indexes are separate objects and can be created or
/// dropped freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn is_supported(&self, intermediate: &Table, change: &Change) -> bool {
        match change {
            // ADD COLUMN cannot carry PRIMARY KEY, and AUTOINCREMENT only
            // exists on an INTEGER PRIMARY KEY.
            Change::AddColumn(c) if c.column.primary_key || c.column.auto_increment => false,
            // DROP COLUMN (3.35+) fails on key, indexed or referencing
            // columns.
            Change::RemoveColumn(c) => {
                // Lookups are case-insensitive: SQLite identifiers are.
                let names = NameMatch::CaseInsensitive;
                let name = c.column.name.as_str();
                !intermediate
                    .find_column(name, names)
                    .is_some_and(|col| col.primary_key)
                    && !intermediate.indexes.iter().any(|i| i.covers(name, names))
                    && !intermediate
                        .foreign_keys
                        .iter()
                        .any(|fk| fk.uses_local_column(name, names))
            }
            Change::AddIndex(_) | Change::RemoveIndex(_) => true,
            Change::AddPrimaryKey(_) => false,
            _ => baseline_supported(intermediate, change),
        }
    }

    /// Autoindexes backing the primary key are internal. Those backing a
    /// UNIQUE constraint carry the constraint and are compared.
    fn is_internal_index(&self, table: &Table, index: &Index) -> bool {
        let primary_key = table.primary_key_columns();
        index
            .name
            .as_deref()
            .is_some_and(|n| n.starts_with(AUTOINDEX_PREFIX))
            && !primary_key.is_empty()
            && NameMatch::CaseInsensitive.matches_all(&index.columns, &primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{AddColumn, AddPrimaryKey, RemoveColumn, RemoveIndex};
    use crate::model::{Column, ForeignKey, TypeCode};

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("id", TypeCode::Integer).primary_key())
            .column(Column::new("customer_id", TypeCode::Integer))
            .column(Column::new("note", TypeCode::Varchar))
            .column(Column::new("code", TypeCode::Varchar))
            .index(Index::new("idx_code", &["code"]))
            .foreign_key(ForeignKey::new("fk_customer", "customers").reference("customer_id", "id"))
    }

    fn remove(name: &str) -> Change {
        Change::RemoveColumn(RemoveColumn {
            table: "orders".into(),
            column: Column::new(name, TypeCode::Varchar),
        })
    }

    #[test]
    fn drop_column_only_when_unconstrained() {
        let dialect = SqliteDialect::new();
        assert!(dialect.is_supported(&orders(), &remove("note")));
        assert!(!dialect.is_supported(&orders(), &remove("id")));
        assert!(!dialect.is_supported(&orders(), &remove("code")));
        assert!(!dialect.is_supported(&orders(), &remove("customer_id")));
    }

    #[test]
    fn dropping_the_index_first_frees_the_column() {
        let dialect = SqliteDialect::new();
        let batch = vec![
            Change::RemoveIndex(RemoveIndex {
                table: "orders".into(),
                index: Index::new("idx_code", &["code"]),
            }),
            remove("code"),
        ];
        assert!(dialect.are_supported(&orders(), &batch, NameMatch::CaseSensitive));
    }

    #[test]
    fn add_column_restrictions() {
        let dialect = SqliteDialect::new();
        let nullable = Change::AddColumn(AddColumn {
            table: "orders".into(),
            column: Column::new("memo", TypeCode::Varchar),
            previous_column: Some("code".into()),
            next_column: None,
        });
        assert!(dialect.is_supported(&orders(), &nullable));

        let generated = Change::AddColumn(AddColumn {
            table: "orders".into(),
            column: Column::new("seq", TypeCode::Integer).auto_increment(),
            previous_column: Some("code".into()),
            next_column: None,
        });
        assert!(!dialect.is_supported(&orders(), &generated));

        let pk = Change::AddPrimaryKey(AddPrimaryKey {
            table: "orders".into(),
            columns: vec!["id".into()],
        });
        assert!(!dialect.is_supported(&orders(), &pk));
    }

    #[test]
    fn primary_key_autoindex_is_internal() {
        let dialect = SqliteDialect::new();
        let table = orders();
        assert!(dialect.is_internal_index(
            &table,
            &Index::new("sqlite_autoindex_orders_1", &["id"])
        ));
        assert!(!dialect.is_internal_index(
            &table,
            &Index::new("sqlite_autoindex_orders_2", &["code"]).unique()
        ));
        assert!(!dialect.is_internal_index(&table, &Index::new("idx_code", &["code"])));
        assert!(!dialect.is_internal_index(&table, &Index::unnamed(&["code"])));
    }
}
