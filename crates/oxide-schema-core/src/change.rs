//! Change vocabulary.
//!
//! A closed set of atomic schema changes. Every change embeds the full
//! before/after data it needs, so a renderer can turn it into SQL without
//! going back to the models it was computed from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Column, Database, ForeignKey, Index, Table};
use crate::names::NameMatch;

/// All atomic changes the comparator can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// Create a table (without its foreign keys).
    AddTable(AddTable),
    /// Drop a table.
    RemoveTable(RemoveTable),
    /// Add a column to an existing table.
    AddColumn(AddColumn),
    /// Drop a column.
    RemoveColumn(RemoveColumn),
    /// Redefine a column's type, size, nullability, default or
    /// auto-increment.
    ColumnDefinitionChange(ColumnDefinitionChange),
    /// Add a primary key to a table without one.
    AddPrimaryKey(AddPrimaryKey),
    /// Drop the primary key.
    RemovePrimaryKey(RemovePrimaryKey),
    /// Replace the primary key with one over different columns.
    PrimaryKeyChange(PrimaryKeyChange),
    /// Create an index.
    AddIndex(AddIndex),
    /// Drop an index.
    RemoveIndex(RemoveIndex),
    /// Add a foreign key constraint.
    AddForeignKey(AddForeignKey),
    /// Drop a foreign key constraint.
    RemoveForeignKey(RemoveForeignKey),
}

/// Create a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTable {
    /// The new table. Its foreign keys are added by separate
    /// [`AddForeignKey`] changes once every table exists.
    pub table: Table,
}

/// Drop a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTable {
    /// The table as it existed before removal.
    pub table: Table,
}

/// Add a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumn {
    /// Table name.
    pub table: String,
    /// The new column.
    pub column: Column,
    /// Column the new one follows; `None` when it becomes the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_column: Option<String>,
    /// Column the new one precedes; `None` when it is appended at the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_column: Option<String>,
}

impl AddColumn {
    /// Returns `true` if the column is appended after every existing
    /// column.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.next_column.is_none()
    }
}

/// Drop a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveColumn {
    /// Table name.
    pub table: String,
    /// The dropped column.
    pub column: Column,
}

/// Redefine a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinitionChange {
    /// Table name.
    pub table: String,
    /// Definition before the change.
    pub old: Column,
    /// Definition after the change.
    pub new: Column,
}

/// Add a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPrimaryKey {
    /// Table name.
    pub table: String,
    /// Key columns in key order.
    pub columns: Vec<String>,
}

/// Drop the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePrimaryKey {
    /// Table name.
    pub table: String,
    /// Columns of the dropped key.
    pub columns: Vec<String>,
}

/// Replace the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyChange {
    /// Table name.
    pub table: String,
    /// Columns of the current key.
    pub old_columns: Vec<String>,
    /// Columns of the new key.
    pub new_columns: Vec<String>,
}

/// Create an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddIndex {
    /// Table name.
    pub table: String,
    /// The new index.
    pub index: Index,
}

/// Drop an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveIndex {
    /// Table name.
    pub table: String,
    /// The dropped index.
    pub index: Index,
}

/// Add a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddForeignKey {
    /// Owning table name.
    pub table: String,
    /// The new constraint.
    pub foreign_key: ForeignKey,
}

/// Drop a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveForeignKey {
    /// Owning table name.
    pub table: String,
    /// The dropped constraint.
    pub foreign_key: ForeignKey,
}

/// Discriminant of a [`Change`], for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// [`Change::AddTable`].
    AddTable,
    /// [`Change::RemoveTable`].
    RemoveTable,
    /// [`Change::AddColumn`].
    AddColumn,
    /// [`Change::RemoveColumn`].
    RemoveColumn,
    /// [`Change::ColumnDefinitionChange`].
    ColumnDefinitionChange,
    /// [`Change::AddPrimaryKey`].
    AddPrimaryKey,
    /// [`Change::RemovePrimaryKey`].
    RemovePrimaryKey,
    /// [`Change::PrimaryKeyChange`].
    PrimaryKeyChange,
    /// [`Change::AddIndex`].
    AddIndex,
    /// [`Change::RemoveIndex`].
    RemoveIndex,
    /// [`Change::AddForeignKey`].
    AddForeignKey,
    /// [`Change::RemoveForeignKey`].
    RemoveForeignKey,
}

impl ChangeKind {
    /// Returns the snake_case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddTable => "add_table",
            Self::RemoveTable => "remove_table",
            Self::AddColumn => "add_column",
            Self::RemoveColumn => "remove_column",
            Self::ColumnDefinitionChange => "column_definition_change",
            Self::AddPrimaryKey => "add_primary_key",
            Self::RemovePrimaryKey => "remove_primary_key",
            Self::PrimaryKeyChange => "primary_key_change",
            Self::AddIndex => "add_index",
            Self::RemoveIndex => "remove_index",
            Self::AddForeignKey => "add_foreign_key",
            Self::RemoveForeignKey => "remove_foreign_key",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Change {
    /// Returns the kind of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::AddTable(_) => ChangeKind::AddTable,
            Self::RemoveTable(_) => ChangeKind::RemoveTable,
            Self::AddColumn(_) => ChangeKind::AddColumn,
            Self::RemoveColumn(_) => ChangeKind::RemoveColumn,
            Self::ColumnDefinitionChange(_) => ChangeKind::ColumnDefinitionChange,
            Self::AddPrimaryKey(_) => ChangeKind::AddPrimaryKey,
            Self::RemovePrimaryKey(_) => ChangeKind::RemovePrimaryKey,
            Self::PrimaryKeyChange(_) => ChangeKind::PrimaryKeyChange,
            Self::AddIndex(_) => ChangeKind::AddIndex,
            Self::RemoveIndex(_) => ChangeKind::RemoveIndex,
            Self::AddForeignKey(_) => ChangeKind::AddForeignKey,
            Self::RemoveForeignKey(_) => ChangeKind::RemoveForeignKey,
        }
    }

    /// Name of the table the change applies to.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::AddTable(c) => &c.table.name,
            Self::RemoveTable(c) => &c.table.name,
            Self::AddColumn(c) => &c.table,
            Self::RemoveColumn(c) => &c.table,
            Self::ColumnDefinitionChange(c) => &c.table,
            Self::AddPrimaryKey(c) => &c.table,
            Self::RemovePrimaryKey(c) => &c.table,
            Self::PrimaryKeyChange(c) => &c.table,
            Self::AddIndex(c) => &c.table,
            Self::RemoveIndex(c) => &c.table,
            Self::AddForeignKey(c) => &c.table,
            Self::RemoveForeignKey(c) => &c.table,
        }
    }

    /// The foreign key carried by an add/remove foreign key change.
    #[must_use]
    pub const fn foreign_key(&self) -> Option<&ForeignKey> {
        match self {
            Self::AddForeignKey(c) => Some(&c.foreign_key),
            Self::RemoveForeignKey(c) => Some(&c.foreign_key),
            _ => None,
        }
    }

    /// The index carried by an add/remove index change.
    #[must_use]
    pub const fn index(&self) -> Option<&Index> {
        match self {
            Self::AddIndex(c) => Some(&c.index),
            Self::RemoveIndex(c) => Some(&c.index),
            _ => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddTable(c) => write!(
                f,
                "add table {} ({} columns)",
                c.table.name,
                c.table.columns.len()
            ),
            Self::RemoveTable(c) => write!(f, "remove table {}", c.table.name),
            Self::AddColumn(c) => {
                write!(f, "add column {}.{} {}", c.table, c.column.name, c.column.type_display())?;
                if c.column.required {
                    f.write_str(" NOT NULL")?;
                }
                if let Some(ref default) = c.column.default {
                    write!(f, " DEFAULT {default}")?;
                }
                if c.column.auto_increment {
                    f.write_str(" AUTO_INCREMENT")?;
                }
                if let Some(ref next) = c.next_column {
                    write!(f, " before {next}")?;
                }
                Ok(())
            }
            Self::RemoveColumn(c) => write!(f, "remove column {}.{}", c.table, c.column.name),
            Self::ColumnDefinitionChange(c) => write!(
                f,
                "redefine column {}.{} {} -> {}",
                c.table,
                c.new.name,
                c.old.type_display(),
                c.new.type_display()
            ),
            Self::AddPrimaryKey(c) => {
                write!(f, "add primary key {} ({})", c.table, c.columns.join(", "))
            }
            Self::RemovePrimaryKey(c) => {
                write!(f, "remove primary key {} ({})", c.table, c.columns.join(", "))
            }
            Self::PrimaryKeyChange(c) => write!(
                f,
                "change primary key {} ({}) -> ({})",
                c.table,
                c.old_columns.join(", "),
                c.new_columns.join(", ")
            ),
            Self::AddIndex(c) => write!(f, "add index {} on {}", c.index.label(), c.table),
            Self::RemoveIndex(c) => write!(f, "remove index {} on {}", c.index.label(), c.table),
            Self::AddForeignKey(c) => {
                write!(f, "add foreign key {} on {}", c.foreign_key.label(), c.table)
            }
            Self::RemoveForeignKey(c) => {
                write!(f, "remove foreign key {} on {}", c.foreign_key.label(), c.table)
            }
        }
    }
}

impl Table {
    /// Replays a change on this table.
    ///
    /// Table-level changes ([`Change::AddTable`], [`Change::RemoveTable`])
    /// are ignored here; use [`Database::apply`] for those.
    pub fn apply(&mut self, change: &Change, names: NameMatch) {
        match change {
            Change::AddTable(_) | Change::RemoveTable(_) => {}
            Change::AddColumn(c) => {
                let position = c
                    .next_column
                    .as_deref()
                    .and_then(|next| self.column_index(next, names))
                    .unwrap_or(self.columns.len());
                self.columns.insert(position, c.column.clone());
            }
            Change::RemoveColumn(c) => {
                if let Some(position) = self.column_index(&c.column.name, names) {
                    self.columns.remove(position);
                }
            }
            Change::ColumnDefinitionChange(c) => {
                if let Some(position) = self.column_index(&c.old.name, names) {
                    self.columns[position] = c.new.clone();
                }
            }
            Change::AddPrimaryKey(AddPrimaryKey { columns, .. })
            | Change::PrimaryKeyChange(PrimaryKeyChange {
                new_columns: columns,
                ..
            }) => {
                for column in &mut self.columns {
                    column.primary_key = names.contains(columns, &column.name);
                }
            }
            Change::RemovePrimaryKey(_) => {
                for column in &mut self.columns {
                    column.primary_key = false;
                }
            }
            Change::AddIndex(c) => self.indexes.push(c.index.clone()),
            Change::RemoveIndex(c) => {
                let position = self
                    .indexes
                    .iter()
                    .position(|i| {
                        i.same_as(&c.index, names)
                            && names.matches_opt(i.name.as_deref(), c.index.name.as_deref())
                    })
                    .or_else(|| self.indexes.iter().position(|i| i.same_as(&c.index, names)));
                if let Some(position) = position {
                    self.indexes.remove(position);
                }
            }
            Change::AddForeignKey(c) => self.foreign_keys.push(c.foreign_key.clone()),
            Change::RemoveForeignKey(c) => {
                if let Some(position) = self
                    .foreign_keys
                    .iter()
                    .position(|fk| fk.same_as(&c.foreign_key, names))
                {
                    self.foreign_keys.remove(position);
                }
            }
        }
    }
}

impl Database {
    /// Replays a change on this database.
    pub fn apply(&mut self, change: &Change, names: NameMatch) {
        match change {
            Change::AddTable(c) => self.tables.push(c.table.clone()),
            Change::RemoveTable(c) => {
                self.tables.retain(|t| !names.matches(&t.name, &c.table.name));
            }
            other => {
                if let Some(table) = self.find_table_mut(other.table_name(), names) {
                    table.apply(other, names);
                }
            }
        }
    }

    /// Replays a sequence of changes in order.
    pub fn apply_all<'a>(
        &mut self,
        changes: impl IntoIterator<Item = &'a Change>,
        names: NameMatch,
    ) {
        for change in changes {
            self.apply(change, names);
        }
    }
}
