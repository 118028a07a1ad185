//! Schema comparison and dialect-aware change planning.
//!
//! `oxide-schema-core` compares two snapshots of a relational schema and
//! works out the atomic changes that turn one into the other:
//!
//! - **Model** - [`Database`], [`Table`], [`Column`], [`Index`] and
//!   [`ForeignKey`] value types, deserializable from JSON
//! - **Changes** - a closed [`Change`] vocabulary that can be replayed on
//!   a model with [`Table::apply`] / [`Database::apply`]
//! - **Dialects** - per-database [`Dialect`] policies deciding which
//!   changes run in place, plus correction rules for known defects
//! - **Comparator** - [`ModelComparator`], producing ordered per-table
//!   batches
//! - **Planner** - [`Planner`], turning unsupported batches into table
//!   rebuilds
//!
//! Rendering the plan into SQL is left to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_schema_core::prelude::*;
//!
//! let source = Database::new("shop").table(
//!     Table::new("users")
//!         .column(Column::new("id", TypeCode::BigInt).primary_key())
//!         .column(Column::new("name", TypeCode::Varchar).size(100).required()),
//! );
//! let target = Database::new("shop").table(
//!     Table::new("users")
//!         .column(Column::new("id", TypeCode::BigInt).primary_key())
//!         .column(Column::new("name", TypeCode::Varchar).size(100).required())
//!         .column(Column::new("email", TypeCode::Varchar).size(255)),
//! );
//!
//! let plan = Planner::new(DialectKind::Sqlite.dialect(), ComparatorOptions::new())
//!     .plan(&source, &target)?;
//! assert_eq!(plan.rebuild_count(), 0);
//! ```

pub mod change;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod model;
pub mod names;
pub mod plan;
mod validate;

pub use change::{Change, ChangeKind};
pub use dialect::{Dialect, DialectKind, GenericDialect};
pub use diff::{ComparatorOptions, Comparison, ModelComparator, TableBatch};
pub use error::{ModelError, Result};
pub use model::{CascadeAction, Column, Database, ForeignKey, Index, Reference, Table, TypeCode};
pub use names::NameMatch;
pub use plan::{MigrationPlan, PlanStep, Planner, TableRebuild};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::change::Change;
    pub use crate::dialect::{
        DerbyDialect, Dialect, DialectKind, GenericDialect, MySqlDialect, PostgresDialect,
        SqliteDialect,
    };
    pub use crate::diff::{ComparatorOptions, ModelComparator};
    pub use crate::model::{CascadeAction, Column, Database, ForeignKey, Index, Table, TypeCode};
    pub use crate::names::NameMatch;
    pub use crate::plan::{MigrationPlan, PlanStep, Planner};
}
