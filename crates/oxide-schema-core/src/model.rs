//! Schema model.
//!
//! Plain value types describing a database snapshot: [`Database`],
//! [`Table`], [`Column`], [`Index`] and [`ForeignKey`]. A snapshot is
//! either read from live metadata or deserialized from JSON and is never
//! mutated by the comparator; the only mutation path is
//! `Table::apply` on an explicit copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::NameMatch;

/// SQL type codes understood by the comparator.
///
/// Size, precision and scale are carried on the [`Column`], so
/// `VARCHAR(32)` and `VARCHAR(64)` share a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeCode {
    /// 8-bit integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Exact decimal with precision and scale.
    Decimal,
    /// Exact numeric with precision and scale.
    Numeric,
    /// Single precision float.
    Real,
    /// Float with optional precision.
    Float,
    /// Double precision float.
    Double,
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    Varchar,
    /// Long variable-length character string.
    LongVarchar,
    /// Character large object.
    Clob,
    /// Fixed-length binary string.
    Binary,
    /// Variable-length binary string.
    Varbinary,
    /// Binary large object.
    Blob,
    /// Boolean.
    Boolean,
    /// Bit.
    Bit,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    Timestamp,
    /// Any vendor type without a portable code.
    Other,
}

impl TypeCode {
    /// Returns the SQL name of the type code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Decimal => "DECIMAL",
            Self::Numeric => "NUMERIC",
            Self::Real => "REAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::LongVarchar => "LONGVARCHAR",
            Self::Clob => "CLOB",
            Self::Binary => "BINARY",
            Self::Varbinary => "VARBINARY",
            Self::Blob => "BLOB",
            Self::Boolean => "BOOLEAN",
            Self::Bit => "BIT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// SQL type code.
    #[serde(rename = "type")]
    pub type_code: TypeCode,
    /// Length or precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Scale for exact numerics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// `NOT NULL`.
    #[serde(default)]
    pub required: bool,
    /// Default value in the dialect's own syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the database generates values for this column.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether this column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl Column {
    /// Creates a nullable column without size, default or key membership.
    #[must_use]
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
            size: None,
            scale: None,
            required: false,
            default: None,
            auto_increment: false,
            primary_key: false,
        }
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the length or precision.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.size = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the column auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Adds the column to the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true; // Primary keys are always NOT NULL
        self
    }

    /// Returns `true` if any attribute that requires redefining the column
    /// differs: type code, size, scale, nullability, default or
    /// auto-increment. Name and key membership are not part of the
    /// definition.
    #[must_use]
    pub fn definition_differs(&self, other: &Self) -> bool {
        self.type_code != other.type_code
            || self.size != other.size
            || self.scale != other.scale
            || self.required != other.required
            || self.default != other.default
            || self.auto_increment != other.auto_increment
    }

    /// Returns `true` if the type code itself changed. Size and scale
    /// changes alone do not count.
    #[must_use]
    pub fn type_changed(&self, other: &Self) -> bool {
        self.type_code != other.type_code
    }

    /// Renders the type with its size, e.g. `DECIMAL(10,2)`.
    #[must_use]
    pub fn type_display(&self) -> String {
        match (self.size, self.scale) {
            (Some(size), Some(scale)) => format!("{}({size},{scale})", self.type_code),
            (Some(size), None) => format!("{}({size})", self.type_code),
            _ => self.type_code.to_string(),
        }
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name; absent for synthetic indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Indexed columns, in index order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    /// Creates a named non-unique index.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: Some(name.into()),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            unique: false,
        }
    }

    /// Creates an index without a name.
    #[must_use]
    pub fn unnamed(columns: &[&str]) -> Self {
        Self {
            name: None,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            unique: false,
        }
    }

    /// Marks the index UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Structural equality: same columns in the same order and same
    /// uniqueness. Names are ignored because they may differ between
    /// environments.
    #[must_use]
    pub fn same_as(&self, other: &Self, names: NameMatch) -> bool {
        self.unique == other.unique && names.matches_all(&self.columns, &other.columns)
    }

    /// Returns `true` if the index covers the named column.
    #[must_use]
    pub fn covers(&self, column: &str, names: NameMatch) -> bool {
        names.contains(&self.columns, column)
    }

    /// Display name, falling back to the column list.
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("({})", self.columns.join(", ")))
    }
}

/// Referential action for ON UPDATE / ON DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeAction {
    /// No action.
    #[default]
    None,
    /// Cascade the operation to referencing rows.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
    /// Set referencing columns to their default.
    SetDefault,
    /// Reject the operation.
    Restrict,
}

impl CascadeAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::None => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
        }
    }
}

/// One local column to foreign column pairing of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Column in the owning table.
    pub local: String,
    /// Column in the referenced table.
    pub foreign: String,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Referenced table.
    pub foreign_table: String,
    /// Column pairs; never empty in a valid model.
    pub references: Vec<Reference>,
    /// ON UPDATE action.
    #[serde(default)]
    pub on_update: CascadeAction,
    /// ON DELETE action.
    #[serde(default)]
    pub on_delete: CascadeAction,
}

impl ForeignKey {
    /// Creates a named foreign key without references.
    #[must_use]
    pub fn new(name: impl Into<String>, foreign_table: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            foreign_table: foreign_table.into(),
            references: Vec::new(),
            on_update: CascadeAction::None,
            on_delete: CascadeAction::None,
        }
    }

    /// Creates an unnamed foreign key without references.
    #[must_use]
    pub fn unnamed(foreign_table: impl Into<String>) -> Self {
        Self {
            name: None,
            ..Self::new("", foreign_table)
        }
    }

    /// Adds a local → foreign column pair.
    #[must_use]
    pub fn reference(mut self, local: impl Into<String>, foreign: impl Into<String>) -> Self {
        self.references.push(Reference {
            local: local.into(),
            foreign: foreign.into(),
        });
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: CascadeAction) -> Self {
        self.on_update = action;
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: CascadeAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Local column names in reference order.
    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.local.as_str())
    }

    /// Returns `true` if the named column is one of the local columns.
    #[must_use]
    pub fn uses_local_column(&self, column: &str, names: NameMatch) -> bool {
        self.local_columns().any(|c| names.matches(c, column))
    }

    /// Structural equality: same referenced table and the same set of
    /// local → foreign pairs. Name, pair order and referential actions are
    /// ignored.
    #[must_use]
    pub fn same_as(&self, other: &Self, names: NameMatch) -> bool {
        let contains = |refs: &[Reference], r: &Reference| {
            refs.iter()
                .any(|o| names.matches(&o.local, &r.local) && names.matches(&o.foreign, &r.foreign))
        };
        names.matches(&self.foreign_table, &other.foreign_table)
            && self.references.len() == other.references.len()
            && self.references.iter().all(|r| contains(&other.references, r))
            && other.references.iter().all(|r| contains(&self.references, r))
    }

    /// Display name, falling back to the referenced table.
    #[must_use]
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            let locals: Vec<&str> = self.local_columns().collect();
            format!("({}) -> {}", locals.join(", "), self.foreign_table)
        })
    }
}

/// A table with its columns, indexes and foreign keys.
///
/// The primary key is implicit: it is made of the columns flagged
/// [`Column::primary_key`], in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    /// Indexes on this table.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Foreign keys owned by this table.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str, names: NameMatch) -> Option<&Column> {
        self.columns.iter().find(|c| names.matches(&c.name, name))
    }

    /// Returns the ordinal position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str, names: NameMatch) -> Option<usize> {
        self.columns.iter().position(|c| names.matches(&c.name, name))
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn find_index(&self, name: &str, names: NameMatch) -> Option<&Index> {
        self.indexes
            .iter()
            .find(|i| i.name.as_deref().is_some_and(|n| names.matches(n, name)))
    }

    /// Looks up a foreign key by name.
    #[must_use]
    pub fn find_foreign_key(&self, name: &str, names: NameMatch) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.name.as_deref().is_some_and(|n| names.matches(n, name)))
    }

    /// Primary key column names in column order; empty when the table has
    /// no primary key.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Returns `true` if at least one column is part of the primary key.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    /// Foreign keys of this table that point at `table`.
    pub fn foreign_keys_referencing<'a>(
        &'a self,
        table: &'a str,
        names: NameMatch,
    ) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.foreign_keys
            .iter()
            .filter(move |fk| names.matches(&fk.foreign_table, table))
    }
}

/// A named, ordered collection of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name.
    #[serde(default)]
    pub name: String,
    /// Tables in declaration order.
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Appends a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn find_table(&self, name: &str, names: NameMatch) -> Option<&Table> {
        self.tables.iter().find(|t| names.matches(&t.name, name))
    }

    /// Looks up a table by name for modification.
    #[must_use]
    pub fn find_table_mut(&mut self, name: &str, names: NameMatch) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| names.matches(&t.name, name))
    }

    /// Returns table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_builder() {
        let col = Column::new("id", TypeCode::BigInt)
            .primary_key()
            .auto_increment();

        assert_eq!(col.name, "id");
        assert!(col.primary_key);
        assert!(col.auto_increment);
        assert!(col.required); // Primary keys are NOT NULL
    }

    #[test]
    fn definition_differs_ignores_key_membership() {
        let a = Column::new("amount", TypeCode::Decimal).precision(10, 2);
        let mut b = a.clone();
        b.primary_key = true;
        assert!(!a.definition_differs(&b));

        let c = Column::new("amount", TypeCode::Decimal).precision(12, 2);
        assert!(a.definition_differs(&c));
        assert!(!a.type_changed(&c));

        let d = Column::new("amount", TypeCode::Double);
        assert!(a.type_changed(&d));
    }

    #[test]
    fn type_display_includes_size() {
        assert_eq!(
            Column::new("a", TypeCode::Decimal).precision(10, 2).type_display(),
            "DECIMAL(10,2)"
        );
        assert_eq!(
            Column::new("b", TypeCode::Varchar).size(64).type_display(),
            "VARCHAR(64)"
        );
        assert_eq!(Column::new("c", TypeCode::Date).type_display(), "DATE");
    }

    #[test]
    fn index_equality_ignores_name() {
        let a = Index::new("idx_a", &["email"]).unique();
        let b = Index::new("idx_b", &["EMAIL"]).unique();
        assert!(!a.same_as(&b, NameMatch::CaseSensitive));
        assert!(a.same_as(&b, NameMatch::CaseInsensitive));
        assert!(!a.same_as(&Index::new("idx_a", &["email"]), NameMatch::CaseSensitive));
    }

    #[test]
    fn foreign_key_equality_ignores_name_and_order() {
        let a = ForeignKey::new("fk_a", "accounts")
            .reference("account_id", "id")
            .reference("region", "region");
        let b = ForeignKey::unnamed("accounts")
            .reference("region", "region")
            .reference("account_id", "id")
            .on_delete(CascadeAction::Cascade);
        assert!(a.same_as(&b, NameMatch::CaseSensitive));

        let c = ForeignKey::new("fk_a", "accounts").reference("account_id", "id");
        assert!(!a.same_as(&c, NameMatch::CaseSensitive));

        let d = ForeignKey::new("fk_a", "ledgers")
            .reference("account_id", "id")
            .reference("region", "region");
        assert!(!a.same_as(&d, NameMatch::CaseSensitive));
    }

    #[test]
    fn table_lookups() {
        let table = Table::new("users")
            .column(Column::new("id", TypeCode::BigInt).primary_key())
            .column(Column::new("Email", TypeCode::Varchar).size(255))
            .index(Index::new("idx_email", &["Email"]))
            .foreign_key(ForeignKey::new("fk_org", "orgs").reference("org_id", "id"));

        assert!(table.find_column("email", NameMatch::CaseSensitive).is_none());
        assert!(table.find_column("email", NameMatch::CaseInsensitive).is_some());
        assert_eq!(table.column_index("Email", NameMatch::CaseSensitive), Some(1));
        assert!(table.find_index("IDX_EMAIL", NameMatch::CaseInsensitive).is_some());
        assert!(table.find_foreign_key("fk_org", NameMatch::CaseSensitive).is_some());
        assert_eq!(table.primary_key_columns(), vec!["id"]);
        assert_eq!(
            table
                .foreign_keys_referencing("ORGS", NameMatch::CaseInsensitive)
                .count(),
            1
        );
    }

    #[test]
    fn json_snapshot_defaults() {
        let json = r#"{
            "name": "shop",
            "tables": [{
                "name": "orders",
                "columns": [
                    {"name": "id", "type": "BIGINT", "required": true, "primary_key": true},
                    {"name": "total", "type": "DECIMAL", "size": 10, "scale": 2}
                ],
                "foreign_keys": [{
                    "foreign_table": "customers",
                    "references": [{"local": "customer_id", "foreign": "id"}],
                    "on_delete": "SET_NULL"
                }]
            }]
        }"#;
        let db: Database = serde_json::from_str(json).unwrap();
        let orders = &db.tables[0];
        assert_eq!(orders.columns[1].type_code, TypeCode::Decimal);
        assert_eq!(orders.columns[1].scale, Some(2));
        assert!(!orders.columns[1].required);
        assert!(orders.indexes.is_empty());
        assert_eq!(orders.foreign_keys[0].on_delete, CascadeAction::SetNull);
        assert_eq!(orders.foreign_keys[0].on_update, CascadeAction::None);
        assert!(orders.foreign_keys[0].name.is_none());
    }
}
