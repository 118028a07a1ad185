//! Apache Derby capability policy.

use std::sync::LazyLock;

use regex::Regex;

use super::{baseline_supported, Dialect};
use crate::change::Change;
use crate::model::{Index, Table};

/// Derby names the indexes backing constraints `SQL` followed by a
/// timestamp-like digit string.
static BACKING_INDEX_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SQL\d+$").expect("backing index pattern is valid"));

/// Derby: constraints and indexes can be altered in place and columns can
/// be dropped or widened, but an identity column cannot be added to an
/// existing table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerbyDialect;

impl DerbyDialect {
    /// Creates a new Derby dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for DerbyDialect {
    fn name(&self) -> &'static str {
        "derby"
    }

    fn is_supported(&self, intermediate: &Table, change: &Change) -> bool {
        match change {
            Change::AddColumn(c) if c.column.auto_increment => false,
            Change::RemoveColumn(_)
            | Change::AddIndex(_)
            | Change::RemoveIndex(_)
            | Change::AddForeignKey(_)
            | Change::RemoveForeignKey(_)
            | Change::RemovePrimaryKey(_) => true,
            Change::ColumnDefinitionChange(c) => {
                let widened = match (c.old.size, c.new.size) {
                    (Some(old), Some(new)) => new >= old,
                    (None, None) => true,
                    _ => false,
                };
                !c.old.type_changed(&c.new)
                    && c.old.auto_increment == c.new.auto_increment
                    && c.old.scale == c.new.scale
                    && widened
            }
            _ => baseline_supported(intermediate, change),
        }
    }

    fn is_internal_index(&self, _table: &Table, index: &Index) -> bool {
        index
            .name
            .as_deref()
            .is_some_and(|n| BACKING_INDEX_NAME.is_match(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{AddColumn, ColumnDefinitionChange};
    use crate::model::{Column, TypeCode};
    use crate::names::NameMatch;

    fn items() -> Table {
        Table::new("items")
            .column(Column::new("id", TypeCode::Integer).primary_key())
            .column(Column::new("label", TypeCode::Varchar).size(40))
    }

    fn redefine(old: Column, new: Column) -> Change {
        Change::ColumnDefinitionChange(ColumnDefinitionChange {
            table: "items".into(),
            old,
            new,
        })
    }

    #[test]
    fn identity_column_forces_rebuild() {
        let dialect = DerbyDialect::new();
        let identity = Change::AddColumn(AddColumn {
            table: "items".into(),
            column: Column::new("seq", TypeCode::BigInt).required().auto_increment(),
            previous_column: Some("label".into()),
            next_column: None,
        });
        // The baseline would accept it: generated values fill existing rows.
        assert!(baseline_supported(&items(), &identity));
        assert!(!dialect.is_supported(&items(), &identity));

        let plain = Change::AddColumn(AddColumn {
            table: "items".into(),
            column: Column::new("note", TypeCode::Varchar),
            previous_column: Some("label".into()),
            next_column: None,
        });
        let batch = vec![plain, identity];
        assert!(!dialect.are_supported(&items(), &batch, NameMatch::CaseSensitive));
    }

    #[test]
    fn columns_can_be_widened_not_narrowed() {
        let dialect = DerbyDialect::new();
        let label = Column::new("label", TypeCode::Varchar).size(40);
        assert!(dialect.is_supported(
            &items(),
            &redefine(label.clone(), Column::new("label", TypeCode::Varchar).size(80))
        ));
        assert!(dialect.is_supported(&items(), &redefine(label.clone(), label.clone().required())));
        assert!(!dialect.is_supported(
            &items(),
            &redefine(label.clone(), Column::new("label", TypeCode::Varchar).size(20))
        ));
        assert!(!dialect.is_supported(
            &items(),
            &redefine(label, Column::new("label", TypeCode::Clob))
        ));
    }

    #[test]
    fn system_named_indexes_are_internal() {
        let dialect = DerbyDialect::new();
        let table = items();
        assert!(dialect.is_internal_index(&table, &Index::new("SQL080101120000000", &["id"])));
        assert!(!dialect.is_internal_index(&table, &Index::new("SQL_LABEL", &["label"])));
        assert!(!dialect.is_internal_index(&table, &Index::unnamed(&["label"])));
    }
}
