//! MySQL capability policy and foreign key corrections.
//!
//! InnoDB requires an index on the local columns of every foreign key and
//! silently creates one, named after the constraint, when none exists.
//! Dropping an index such a constraint relies on fails, and changing the
//! type of a constrained column is only checked when the constraint is
//! created. Both are handled by dropping the affected foreign keys before
//! the batch and adding them back after it.

use super::{
    can_fill_existing_rows, recreate_foreign_keys, CorrectionRule, Corrections, Dialect, TablePair,
};
use crate::change::Change;
use crate::model::{Index, Table};
use crate::names::NameMatch;

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn is_supported(&self, _intermediate: &Table, change: &Change) -> bool {
        match change {
            // ADD COLUMN ... FIRST / AFTER places the column anywhere.
            Change::AddColumn(c) => can_fill_existing_rows(&c.column),
            Change::AddTable(_) | Change::RemoveTable(_) => false,
            _ => true,
        }
    }

    fn is_internal_index(&self, table: &Table, index: &Index) -> bool {
        // Identifiers are matched case-insensitively, as MySQL does for
        // index and constraint names.
        let names = NameMatch::CaseInsensitive;
        let Some(name) = index.name.as_deref() else {
            return false;
        };
        if names.matches(name, "PRIMARY") {
            return true;
        }
        table.foreign_keys.iter().any(|fk| {
            fk.name.as_deref().is_some_and(|n| names.matches(n, name))
                && fk.references.len() <= index.columns.len()
                && fk
                    .local_columns()
                    .zip(&index.columns)
                    .all(|(local, col)| names.matches(local, col))
        })
    }

    fn correction_rules(&self) -> &'static [CorrectionRule] {
        &[
            recreate_foreign_keys_around_dropped_indexes,
            recreate_foreign_keys_of_retyped_columns,
        ]
    }
}

/// Drops and re-adds every surviving foreign key whose local columns
/// overlap a dropped index.
fn recreate_foreign_keys_around_dropped_indexes(
    pair: &TablePair<'_>,
    changes: &[Change],
) -> Corrections {
    let dropped: Vec<&str> = changes
        .iter()
        .filter_map(|c| match c {
            Change::RemoveIndex(r) => Some(r.index.columns.iter().map(String::as_str)),
            _ => None,
        })
        .flatten()
        .collect();
    if dropped.is_empty() {
        return Corrections::default();
    }
    recreate_foreign_keys(pair, |fk| {
        dropped.iter().any(|c| fk.uses_local_column(c, pair.names))
    })
}

/// Drops and re-adds every surviving foreign key over a column whose type
/// code changes. A size-only change keeps the constraint.
fn recreate_foreign_keys_of_retyped_columns(
    pair: &TablePair<'_>,
    changes: &[Change],
) -> Corrections {
    let retyped: Vec<&str> = changes
        .iter()
        .filter_map(|c| match c {
            Change::ColumnDefinitionChange(d) if d.old.type_changed(&d.new) => {
                Some(d.new.name.as_str())
            }
            _ => None,
        })
        .collect();
    if retyped.is_empty() {
        return Corrections::default();
    }
    recreate_foreign_keys(pair, |fk| {
        retyped.iter().any(|c| fk.uses_local_column(c, pair.names))
    })
}
