//! PostgreSQL capability policy.

use super::{baseline_supported, Dialect};
use crate::change::Change;
use crate::model::{Index, Table};
use crate::names::NameMatch;

/// PostgreSQL: every change can be expressed with `ALTER TABLE`, except
/// placing a new column anywhere but at the end and adding a NOT NULL
/// column existing rows cannot be filled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn is_supported(&self, intermediate: &Table, change: &Change) -> bool {
        match change {
            Change::AddColumn(_) => baseline_supported(intermediate, change),
            Change::AddTable(_) | Change::RemoveTable(_) => false,
            _ => true,
        }
    }

    /// `<table>_pkey` backs the primary key and goes with it. Indexes
    /// backing UNIQUE constraints are the only trace of the constraint in
    /// the model, so they are compared like any other index.
    fn is_internal_index(&self, table: &Table, index: &Index) -> bool {
        let Some(name) = index.name.as_deref() else {
            return false;
        };
        let names = NameMatch::CaseSensitive;
        let pkey = format!("{}_pkey", table.name);
        let primary_key = table.primary_key_columns();
        names.matches(name, &pkey)
            && !primary_key.is_empty()
            && names.matches_all(&index.columns, &primary_key)
    }
}
