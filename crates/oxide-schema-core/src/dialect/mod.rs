//! Dialect capability policies.
//!
//! A [`Dialect`] answers one question for the comparator: can this batch
//! of changes be applied to the table in place, or must the table be
//! rebuilt? It can also hide dialect-internal indexes from the diff and
//! contribute correction rules that inject compensating changes for known
//! dialect defects.

mod derby;
mod mysql;
mod postgres;
mod sqlite;

pub use derby::DerbyDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::change::{AddForeignKey, Change, RemoveForeignKey};
use crate::model::{Column, ForeignKey, Index, Table};
use crate::names::NameMatch;

/// The two versions of a table a correction rule looks at.
#[derive(Debug, Clone, Copy)]
pub struct TablePair<'a> {
    /// The table as it stands before the batch is applied.
    pub intermediate: &'a Table,
    /// The desired table.
    pub target: &'a Table,
    /// Identifier matching in effect.
    pub names: NameMatch,
}

/// Changes injected by a correction rule.
///
/// `removals` are placed after the batch's foreign key removals and
/// `additions` after its foreign key additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corrections {
    /// Changes that must run before the base changes.
    pub removals: Vec<Change>,
    /// Changes that must run after the base changes.
    pub additions: Vec<Change>,
}

impl Corrections {
    /// Returns `true` if the rule injected nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

/// A dialect-specific rule run on a table's base batch.
pub type CorrectionRule = fn(&TablePair<'_>, &[Change]) -> Corrections;

/// Per-dialect capability policy and comparator hooks.
///
/// Every method has a default; a dialect overrides only what differs from
/// the baseline.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Can `change` be applied in place to `intermediate`, the table as it
    /// stands right before the change?
    fn is_supported(&self, intermediate: &Table, change: &Change) -> bool {
        baseline_supported(intermediate, change)
    }

    /// Can the whole batch be applied in place?
    ///
    /// The batch is replayed on a copy of `intermediate` so that each change
    /// is judged against the state it would actually meet.
    fn are_supported(&self, intermediate: &Table, changes: &[Change], names: NameMatch) -> bool {
        let mut table = intermediate.clone();
        for change in changes {
            if !self.is_supported(&table, change) {
                debug!(
                    dialect = self.name(),
                    table = %table.name,
                    change = %change,
                    "Change not supported in place"
                );
                return false;
            }
            table.apply(change, names);
        }
        true
    }

    /// Is `index` created by the database itself to back a constraint?
    /// Such indexes are left out of the comparison.
    fn is_internal_index(&self, _table: &Table, _index: &Index) -> bool {
        false
    }

    /// Rules run after the base batch is computed.
    fn correction_rules(&self) -> &'static [CorrectionRule] {
        &[]
    }
}

/// Baseline policy shared by every dialect.
///
/// Only two changes are in-place by default: appending a column existing
/// rows can be filled for, and adding a primary key.
#[must_use]
pub fn baseline_supported(_intermediate: &Table, change: &Change) -> bool {
    match change {
        Change::AddColumn(c) => c.is_at_end() && can_fill_existing_rows(&c.column),
        Change::AddPrimaryKey(_) => true,
        _ => false,
    }
}

/// A NOT NULL column without a default cannot be added to a table with
/// rows, unless the database generates its values.
#[must_use]
pub fn can_fill_existing_rows(column: &Column) -> bool {
    !column.required || column.default.is_some() || column.auto_increment
}

/// Builds a drop/re-add pair for every foreign key of the target table
/// that `affected` selects and that still exists, unchanged, in the
/// intermediate table.
pub(crate) fn recreate_foreign_keys(
    pair: &TablePair<'_>,
    affected: impl Fn(&ForeignKey) -> bool,
) -> Corrections {
    let mut corrections = Corrections::default();
    for fk in pair.target.foreign_keys.iter().filter(|fk| affected(fk)) {
        let Some(existing) = pair
            .intermediate
            .foreign_keys
            .iter()
            .find(|o| o.same_as(fk, pair.names))
        else {
            continue;
        };
        corrections
            .removals
            .push(Change::RemoveForeignKey(RemoveForeignKey {
                table: pair.intermediate.name.clone(),
                foreign_key: existing.clone(),
            }));
        corrections.additions.push(Change::AddForeignKey(AddForeignKey {
            table: pair.target.name.clone(),
            foreign_key: fk.clone(),
        }));
    }
    corrections
}

/// Dialect with the baseline policy only.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates the generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// Selects one of the built-in dialects by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// [`GenericDialect`].
    #[default]
    Generic,
    /// [`SqliteDialect`].
    Sqlite,
    /// [`PostgresDialect`].
    Postgres,
    /// [`MySqlDialect`].
    MySql,
    /// [`DerbyDialect`].
    Derby,
}

static GENERIC: GenericDialect = GenericDialect;
static SQLITE: SqliteDialect = SqliteDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static MYSQL: MySqlDialect = MySqlDialect;
static DERBY: DerbyDialect = DerbyDialect;

impl DialectKind {
    /// Every built-in dialect.
    pub const ALL: [Self; 5] = [
        Self::Generic,
        Self::Sqlite,
        Self::Postgres,
        Self::MySql,
        Self::Derby,
    ];

    /// Returns the dialect name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Derby => "derby",
        }
    }

    /// Returns the dialect implementation.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Generic => &GENERIC,
            Self::Sqlite => &SQLITE,
            Self::Postgres => &POSTGRES,
            Self::MySql => &MYSQL,
            Self::Derby => &DERBY,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unrecognised dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown dialect '{0}' (expected one of: generic, sqlite, postgres, mysql, derby)")]
pub struct UnknownDialect(pub String);

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "derby" => Ok(Self::Derby),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{AddColumn, AddIndex, AddPrimaryKey, RemoveColumn};
    use crate::model::TypeCode;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", TypeCode::BigInt).primary_key())
            .column(Column::new("name", TypeCode::Varchar).size(100).required())
    }

    fn add(column: Column, next: Option<&str>) -> Change {
        Change::AddColumn(AddColumn {
            table: "users".into(),
            column,
            previous_column: None,
            next_column: next.map(str::to_string),
        })
    }

    #[test]
    fn baseline_allows_nullable_appended_column() {
        let change = add(Column::new("email", TypeCode::Varchar), None);
        assert!(baseline_supported(&users(), &change));
    }

    #[test]
    fn baseline_rejects_required_column_without_default() {
        let change = add(Column::new("email", TypeCode::Varchar).required(), None);
        assert!(!baseline_supported(&users(), &change));

        let with_default = add(
            Column::new("email", TypeCode::Varchar)
                .required()
                .default_value("''"),
            None,
        );
        assert!(baseline_supported(&users(), &with_default));

        let generated = add(
            Column::new("seq", TypeCode::BigInt).required().auto_increment(),
            None,
        );
        assert!(baseline_supported(&users(), &generated));
    }

    #[test]
    fn baseline_rejects_inserted_column() {
        let change = add(Column::new("email", TypeCode::Varchar), Some("name"));
        assert!(!baseline_supported(&users(), &change));
    }

    #[test]
    fn baseline_allows_primary_key_and_nothing_else() {
        let pk = Change::AddPrimaryKey(AddPrimaryKey {
            table: "users".into(),
            columns: vec!["id".into()],
        });
        assert!(baseline_supported(&users(), &pk));

        let idx = Change::AddIndex(AddIndex {
            table: "users".into(),
            index: Index::new("idx_name", &["name"]),
        });
        assert!(!baseline_supported(&users(), &idx));

        let drop = Change::RemoveColumn(RemoveColumn {
            table: "users".into(),
            column: Column::new("name", TypeCode::Varchar),
        });
        assert!(!baseline_supported(&users(), &drop));
    }

    #[test]
    fn batch_is_judged_against_replayed_state() {
        let dialect = GenericDialect::new();
        let batch = vec![
            add(Column::new("a", TypeCode::Integer), None),
            add(Column::new("b", TypeCode::Integer), None),
        ];
        assert!(dialect.are_supported(&users(), &batch, NameMatch::CaseSensitive));

        let with_bad = vec![
            add(Column::new("a", TypeCode::Integer), None),
            add(Column::new("b", TypeCode::Integer).required(), None),
        ];
        assert!(!dialect.are_supported(&users(), &with_bad, NameMatch::CaseSensitive));
    }

    #[test]
    fn dialect_kind_parses_names() {
        assert_eq!("MySQL".parse::<DialectKind>(), Ok(DialectKind::MySql));
        assert_eq!("postgresql".parse::<DialectKind>(), Ok(DialectKind::Postgres));
        assert!("oracle".parse::<DialectKind>().is_err());
        for kind in DialectKind::ALL {
            assert_eq!(kind.dialect().name(), kind.as_str());
            assert_eq!(kind.as_str().parse::<DialectKind>(), Ok(kind));
        }
    }

    #[test]
    fn recreate_only_touches_surviving_foreign_keys() {
        let fk = ForeignKey::new("fk_org", "orgs").reference("org_id", "id");
        let intermediate = users()
            .column(Column::new("org_id", TypeCode::BigInt))
            .foreign_key(fk.clone());
        let target = intermediate
            .clone()
            .foreign_key(ForeignKey::new("fk_team", "teams").reference("org_id", "id"));
        let pair = TablePair {
            intermediate: &intermediate,
            target: &target,
            names: NameMatch::CaseSensitive,
        };

        let corrections =
            recreate_foreign_keys(&pair, |f| f.uses_local_column("org_id", pair.names));
        // fk_team is new, so only fk_org is dropped and re-added.
        assert_eq!(corrections.removals.len(), 1);
        assert_eq!(corrections.additions.len(), 1);
        assert_eq!(corrections.removals[0].foreign_key(), Some(&fk));
    }
}
