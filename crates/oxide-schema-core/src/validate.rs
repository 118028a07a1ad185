//! Model validation.
//!
//! The comparator assumes its inputs are consistent. [`Database::validate`]
//! is the boundary check that enforces this before planning.

use crate::error::{ModelError, Result};
use crate::model::{Database, Table};
use crate::names::NameMatch;

impl Database {
    /// Checks the structural invariants of every table and returns the
    /// first violation found.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] naming the offending table and element.
    pub fn validate(&self, names: NameMatch) -> Result<()> {
        for (i, table) in self.tables.iter().enumerate() {
            if self.tables[..i].iter().any(|t| names.matches(&t.name, &table.name)) {
                return Err(ModelError::DuplicateTable {
                    table: table.name.clone(),
                });
            }
            table.validate(names)?;
        }
        Ok(())
    }
}

impl Table {
    /// Checks the structural invariants of this table.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] naming the offending element.
    pub fn validate(&self, names: NameMatch) -> Result<()> {
        self.validate_columns(names)?;
        self.validate_indexes(names)?;
        self.validate_foreign_keys(names)
    }

    fn validate_columns(&self, names: NameMatch) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| names.matches(&c.name, &column.name)) {
                return Err(ModelError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
            if column.primary_key && !column.required {
                return Err(ModelError::NullablePrimaryKey {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_indexes(&self, names: NameMatch) -> Result<()> {
        for (i, index) in self.indexes.iter().enumerate() {
            if let Some(name) = index.name.as_deref() {
                let duplicate = self.indexes[..i]
                    .iter()
                    .any(|other| other.name.as_deref().is_some_and(|n| names.matches(n, name)));
                if duplicate {
                    return Err(ModelError::DuplicateIndex {
                        table: self.name.clone(),
                        index: name.to_string(),
                    });
                }
            }
            if index.columns.is_empty() {
                return Err(ModelError::EmptyIndex {
                    table: self.name.clone(),
                    index: index.label(),
                });
            }
            if let Some(column) = index
                .columns
                .iter()
                .find(|c| self.find_column(c, names).is_none())
            {
                return Err(ModelError::UnknownIndexColumn {
                    table: self.name.clone(),
                    index: index.label(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(&self, names: NameMatch) -> Result<()> {
        for (i, fk) in self.foreign_keys.iter().enumerate() {
            if fk.references.is_empty() {
                return Err(ModelError::EmptyForeignKey {
                    table: self.name.clone(),
                    foreign_key: fk.label(),
                });
            }
            if let Some(column) = fk
                .local_columns()
                .find(|c| self.find_column(c, names).is_none())
            {
                return Err(ModelError::UnknownForeignKeyColumn {
                    table: self.name.clone(),
                    foreign_key: fk.label(),
                    column: column.to_string(),
                });
            }
            for earlier in &self.foreign_keys[..i] {
                if let (Some(a), Some(b)) = (earlier.name.as_deref(), fk.name.as_deref()) {
                    if names.matches(a, b) {
                        return Err(ModelError::DuplicateForeignKey {
                            table: self.name.clone(),
                            foreign_key: b.to_string(),
                        });
                    }
                }
                if earlier.same_as(fk, names) {
                    return Err(ModelError::AmbiguousForeignKey {
                        table: self.name.clone(),
                        first: earlier.label(),
                        second: fk.label(),
                    });
                }
            }
        }
        Ok(())
    }
}
