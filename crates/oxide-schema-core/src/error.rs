//! Error types for model validation.

/// A schema model that violates a structural invariant.
///
/// Raised when a snapshot is validated, before any comparison runs. The
/// comparator itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Two tables share a name.
    #[error("Duplicate table '{table}'")]
    DuplicateTable {
        /// The duplicated table name.
        table: String,
    },

    /// Two columns of one table share a name.
    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// Owning table.
        table: String,
        /// The duplicated column name.
        column: String,
    },

    /// A primary key column allows NULL.
    #[error("Primary key column '{column}' in table '{table}' must be required")]
    NullablePrimaryKey {
        /// Owning table.
        table: String,
        /// The offending column.
        column: String,
    },

    /// Two indexes of one table share a name.
    #[error("Duplicate index '{index}' in table '{table}'")]
    DuplicateIndex {
        /// Owning table.
        table: String,
        /// The duplicated index name.
        index: String,
    },

    /// An index lists no columns.
    #[error("Index '{index}' in table '{table}' has no columns")]
    EmptyIndex {
        /// Owning table.
        table: String,
        /// Index name or column list.
        index: String,
    },

    /// An index refers to a column the table does not have.
    #[error("Index '{index}' in table '{table}' refers to unknown column '{column}'")]
    UnknownIndexColumn {
        /// Owning table.
        table: String,
        /// Index name or column list.
        index: String,
        /// The missing column.
        column: String,
    },

    /// A foreign key has no column pairs.
    #[error("Foreign key '{foreign_key}' in table '{table}' has no references")]
    EmptyForeignKey {
        /// Owning table.
        table: String,
        /// Foreign key name or description.
        foreign_key: String,
    },

    /// A foreign key refers to a local column the table does not have.
    #[error(
        "Foreign key '{foreign_key}' in table '{table}' refers to unknown local column '{column}'"
    )]
    UnknownForeignKeyColumn {
        /// Owning table.
        table: String,
        /// Foreign key name or description.
        foreign_key: String,
        /// The missing column.
        column: String,
    },

    /// Two foreign keys of one table share a name.
    #[error("Duplicate foreign key '{foreign_key}' in table '{table}'")]
    DuplicateForeignKey {
        /// Owning table.
        table: String,
        /// The duplicated foreign key name.
        foreign_key: String,
    },

    /// Two foreign keys of one table have identical column pairs and
    /// referenced table, so matching them across models is ambiguous.
    #[error(
        "Foreign keys '{first}' and '{second}' in table '{table}' reference the same columns"
    )]
    AmbiguousForeignKey {
        /// Owning table.
        table: String,
        /// First foreign key name or description.
        first: String,
        /// Second foreign key name or description.
        second: String,
    },
}

impl ModelError {
    /// Name of the table the error was found in.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::DuplicateTable { table }
            | Self::DuplicateColumn { table, .. }
            | Self::NullablePrimaryKey { table, .. }
            | Self::DuplicateIndex { table, .. }
            | Self::EmptyIndex { table, .. }
            | Self::UnknownIndexColumn { table, .. }
            | Self::EmptyForeignKey { table, .. }
            | Self::UnknownForeignKeyColumn { table, .. }
            | Self::DuplicateForeignKey { table, .. }
            | Self::AmbiguousForeignKey { table, .. } => table,
        }
    }
}

/// Result type for model validation and planning.
pub type Result<T> = std::result::Result<T, ModelError>;
