//! Model comparator.
//!
//! Compares a source [`Database`] against a target and produces, per
//! table, an ordered batch of atomic [`Change`]s together with the
//! dialect's verdict on whether the batch can be applied in place.
//!
//! Every emitted change is replayed on an intermediate copy of the source,
//! so each batch is computed and judged against the state the database
//! will actually be in when the batch runs.

use serde::Serialize;
use tracing::debug;

use crate::change::{
    AddColumn, AddForeignKey, AddIndex, AddPrimaryKey, AddTable, Change, ColumnDefinitionChange,
    PrimaryKeyChange, RemoveColumn, RemoveForeignKey, RemoveIndex, RemovePrimaryKey, RemoveTable,
};
use crate::dialect::{Corrections, Dialect, TablePair};
use crate::model::{Database, ForeignKey, Index, Table};
use crate::names::NameMatch;

/// Options controlling the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparatorOptions {
    /// How identifiers are matched across the two models.
    pub names: NameMatch,
}

impl ComparatorOptions {
    /// Creates default options: case-sensitive identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets identifier case sensitivity.
    #[must_use]
    pub const fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.names = NameMatch::from_case_sensitive(case_sensitive);
        self
    }
}

/// Changes for one table present in both models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBatch {
    /// Table name.
    pub table: String,
    /// The table as it stands right before the batch runs.
    #[serde(skip)]
    pub intermediate: Table,
    /// The desired table.
    #[serde(skip)]
    pub target: Table,
    /// Changes in application order.
    pub changes: Vec<Change>,
    /// Whether the dialect can apply every change in place.
    pub supported: bool,
}

/// Result of comparing two models.
///
/// The changes are grouped in the order they must run: table removals,
/// table additions, per-table batches, then the foreign keys of the added
/// tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    /// Foreign key drops that unblock table removals, followed by the
    /// table removals themselves.
    pub table_removals: Vec<Change>,
    /// New tables, created without their foreign keys.
    pub table_additions: Vec<Change>,
    /// One batch per changed table, in target order.
    pub table_batches: Vec<TableBatch>,
    /// Foreign keys of the new tables.
    pub foreign_key_additions: Vec<Change>,
}

impl Comparison {
    /// Returns `true` if the models are structurally equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table_removals.is_empty()
            && self.table_additions.is_empty()
            && self.table_batches.is_empty()
            && self.foreign_key_additions.is_empty()
    }

    /// Every change, in application order.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.table_removals
            .iter()
            .chain(&self.table_additions)
            .chain(self.table_batches.iter().flat_map(|b| &b.changes))
            .chain(&self.foreign_key_additions)
    }

    /// Returns the batch computed for a table, if it changed.
    #[must_use]
    pub fn batch(&self, table: &str) -> Option<&TableBatch> {
        self.table_batches.iter().find(|b| b.table == table)
    }
}

/// The diff engine.
#[derive(Debug, Clone, Copy)]
pub struct ModelComparator<'a> {
    dialect: &'a dyn Dialect,
    options: ComparatorOptions,
}

impl<'a> ModelComparator<'a> {
    /// Creates a comparator for a dialect.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, options: ComparatorOptions) -> Self {
        Self { dialect, options }
    }

    /// Compares `source` against `target`.
    ///
    /// Both models are assumed to be valid; see [`Database::validate`].
    #[must_use]
    pub fn compare(&self, source: &Database, target: &Database) -> Comparison {
        let names = self.options.names;
        let mut intermediate = source.clone();
        let mut comparison = Comparison::default();

        // Tables outside both models are external references, not removals.
        let is_removed = |name: &str| {
            source.find_table(name, names).is_some() && target.find_table(name, names).is_none()
        };

        // ---- Foreign keys blocking table removals ------------------
        for table in &source.tables {
            let doomed: Vec<&ForeignKey> = if is_removed(&table.name) {
                table.foreign_keys.iter().collect()
            } else {
                table
                    .foreign_keys
                    .iter()
                    .filter(|fk| is_removed(&fk.foreign_table))
                    .collect()
            };
            for fk in doomed {
                comparison
                    .table_removals
                    .push(Change::RemoveForeignKey(RemoveForeignKey {
                        table: table.name.clone(),
                        foreign_key: fk.clone(),
                    }));
            }
        }

        // ---- Removed tables ----------------------------------------
        for table in source.tables.iter().filter(|t| is_removed(&t.name)) {
            comparison.table_removals.push(Change::RemoveTable(RemoveTable {
                table: table.clone(),
            }));
        }
        intermediate.apply_all(&comparison.table_removals, names);

        // ---- Added tables ------------------------------------------
        for table in &target.tables {
            if source.find_table(&table.name, names).is_some() {
                continue;
            }
            let mut created = table.clone();
            created.foreign_keys.clear();
            comparison
                .table_additions
                .push(Change::AddTable(AddTable { table: created }));
            comparison
                .foreign_key_additions
                .extend(table.foreign_keys.iter().map(|fk| {
                    Change::AddForeignKey(AddForeignKey {
                        table: table.name.clone(),
                        foreign_key: fk.clone(),
                    })
                }));
        }
        intermediate.apply_all(&comparison.table_additions, names);

        // ---- Tables in both models ---------------------------------
        for to in &target.tables {
            if source.find_table(&to.name, names).is_none() {
                continue;
            }
            let Some(from) = intermediate.find_table(&to.name, names) else {
                continue;
            };
            let Some(batch) = self.compare_tables(from, to) else {
                continue;
            };
            debug!(
                table = %batch.table,
                changes = batch.changes.len(),
                supported = batch.supported,
                "Computed table batch"
            );
            intermediate.apply_all(&batch.changes, names);
            comparison.table_batches.push(batch);
        }

        debug!(
            dialect = self.dialect.name(),
            removed_tables = comparison
                .table_removals
                .iter()
                .filter(|c| matches!(c, Change::RemoveTable(_)))
                .count(),
            added_tables = comparison.table_additions.len(),
            changed_tables = comparison.table_batches.len(),
            "Compared models"
        );
        comparison
    }

    /// Computes the batch turning `from` into `to`, or `None` when the
    /// tables are already structurally equal.
    #[must_use]
    pub fn compare_tables(&self, from: &Table, to: &Table) -> Option<TableBatch> {
        let names = self.options.names;
        let mut working = from.clone();
        let mut base = Vec::new();
        let mut emit = |working: &mut Table, change: Change| {
            working.apply(&change, names);
            base.push(change);
        };

        // Step 1: foreign key removals.
        let (removed_fks, added_fks) = pair_up(
            &from.foreign_keys,
            &to.foreign_keys,
            |a, b| a.same_as(b, names),
            |a, b| names.matches_opt(a.name.as_deref(), b.name.as_deref()),
        );
        for fk in removed_fks {
            emit(
                &mut working,
                Change::RemoveForeignKey(RemoveForeignKey {
                    table: from.name.clone(),
                    foreign_key: fk.clone(),
                }),
            );
        }

        // Step 2: index removals, leaving dialect-internal indexes alone.
        let from_indexes: Vec<Index> = from
            .indexes
            .iter()
            .filter(|i| !self.dialect.is_internal_index(from, i))
            .cloned()
            .collect();
        let to_indexes: Vec<Index> = to
            .indexes
            .iter()
            .filter(|i| !self.dialect.is_internal_index(to, i))
            .cloned()
            .collect();
        let (removed_indexes, added_indexes) = pair_up(
            &from_indexes,
            &to_indexes,
            |a, b| a.same_as(b, names),
            |a, b| names.matches_opt(a.name.as_deref(), b.name.as_deref()),
        );
        for index in removed_indexes {
            emit(
                &mut working,
                Change::RemoveIndex(RemoveIndex {
                    table: from.name.clone(),
                    index: index.clone(),
                }),
            );
        }

        // Step 3: primary key.
        let old_pk = from.primary_key_columns();
        let new_pk = to.primary_key_columns();
        if !names.matches_all(&old_pk, &new_pk) {
            let table = from.name.clone();
            let change = match (old_pk.is_empty(), new_pk.is_empty()) {
                (true, _) => Change::AddPrimaryKey(AddPrimaryKey {
                    table,
                    columns: new_pk,
                }),
                (false, true) => Change::RemovePrimaryKey(RemovePrimaryKey {
                    table,
                    columns: old_pk,
                }),
                (false, false) => Change::PrimaryKeyChange(PrimaryKeyChange {
                    table,
                    old_columns: old_pk,
                    new_columns: new_pk,
                }),
            };
            emit(&mut working, change);
        }

        // Step 4: columns. Removals first, then additions and
        // redefinitions in target order.
        for column in &from.columns {
            if to.find_column(&column.name, names).is_none() {
                emit(
                    &mut working,
                    Change::RemoveColumn(RemoveColumn {
                        table: from.name.clone(),
                        column: column.clone(),
                    }),
                );
            }
        }
        for (position, column) in to.columns.iter().enumerate() {
            if let Some(existing) = working.find_column(&column.name, names) {
                if existing.definition_differs(column) {
                    let change = Change::ColumnDefinitionChange(ColumnDefinitionChange {
                        table: from.name.clone(),
                        old: existing.clone(),
                        new: column.clone(),
                    });
                    emit(&mut working, change);
                }
                continue;
            }
            let (previous_column, next_column) = neighbours(&working, to, position, names);
            let change = Change::AddColumn(AddColumn {
                table: from.name.clone(),
                column: column.clone(),
                previous_column,
                next_column,
            });
            emit(&mut working, change);
        }

        // Step 5: index additions.
        for index in added_indexes {
            emit(
                &mut working,
                Change::AddIndex(AddIndex {
                    table: from.name.clone(),
                    index: index.clone(),
                }),
            );
        }

        // Step 6: foreign key additions.
        for fk in added_fks {
            emit(
                &mut working,
                Change::AddForeignKey(AddForeignKey {
                    table: from.name.clone(),
                    foreign_key: fk.clone(),
                }),
            );
        }

        let pair = TablePair {
            intermediate: from,
            target: to,
            names,
        };
        let changes = self.apply_corrections(&pair, base);
        if changes.is_empty() {
            return None;
        }
        let supported = self.dialect.are_supported(from, &changes, names);
        Some(TableBatch {
            table: to.name.clone(),
            intermediate: from.clone(),
            target: to.clone(),
            changes,
            supported,
        })
    }

    /// Runs the dialect's correction rules and splices the injected
    /// changes into the base batch.
    fn apply_corrections(&self, pair: &TablePair<'_>, base: Vec<Change>) -> Vec<Change> {
        let rules = self.dialect.correction_rules();
        if rules.is_empty() || base.is_empty() {
            return base;
        }
        let names = pair.names;

        let mut injected = Corrections::default();
        for rule in rules {
            let corrections = rule(pair, &base);
            for change in corrections.removals {
                if !touches_same_foreign_key(&base, &injected.removals, &change, names) {
                    injected.removals.push(change);
                }
            }
            for change in corrections.additions {
                if !touches_same_foreign_key(&base, &injected.additions, &change, names) {
                    injected.additions.push(change);
                }
            }
        }
        if injected.is_empty() {
            return base;
        }
        debug!(
            table = %pair.target.name,
            removals = injected.removals.len(),
            additions = injected.additions.len(),
            "Injected dialect corrections"
        );

        let split = base
            .iter()
            .position(|c| !matches!(c, Change::RemoveForeignKey(_)))
            .unwrap_or(base.len());
        let mut changes =
            Vec::with_capacity(base.len() + injected.removals.len() + injected.additions.len());
        let mut base = base.into_iter();
        changes.extend(base.by_ref().take(split));
        changes.extend(injected.removals);
        changes.extend(base);
        changes.extend(injected.additions);
        changes
    }
}

/// Returns `true` if `change` carries a foreign key that one of the
/// changes of the same kind in `base` or `injected` already carries.
fn touches_same_foreign_key(
    base: &[Change],
    injected: &[Change],
    change: &Change,
    names: NameMatch,
) -> bool {
    let Some(fk) = change.foreign_key() else {
        return false;
    };
    base.iter()
        .chain(injected)
        .filter(|c| c.kind() == change.kind())
        .filter_map(Change::foreign_key)
        .any(|other| other.same_as(fk, names))
}

/// Matches old against new elements one to one.
///
/// Elements are paired by `same`, preferring a partner that `same_name`
/// also accepts. Returns the unmatched old elements and the unmatched new
/// elements, each in their original order.
fn pair_up<'t, T>(
    old: &'t [T],
    new: &'t [T],
    same: impl Fn(&T, &T) -> bool,
    same_name: impl Fn(&T, &T) -> bool,
) -> (Vec<&'t T>, Vec<&'t T>) {
    let mut taken = vec![false; new.len()];
    let mut matched = vec![false; old.len()];
    for strict in [true, false] {
        for (i, o) in old.iter().enumerate() {
            if matched[i] {
                continue;
            }
            let partner = new
                .iter()
                .enumerate()
                .find(|&(j, n)| !taken[j] && same(o, n) && (!strict || same_name(o, n)));
            if let Some((j, _)) = partner {
                taken[j] = true;
                matched[i] = true;
            }
        }
    }
    let removed = old
        .iter()
        .zip(&matched)
        .filter_map(|(o, m)| (!m).then_some(o))
        .collect();
    let added = new
        .iter()
        .zip(&taken)
        .filter_map(|(n, t)| (!t).then_some(n))
        .collect();
    (removed, added)
}

/// Places the target column at `position` in `working`.
///
/// The column goes right before the first later target column that already
/// exists; when there is none it is appended.
fn neighbours(
    working: &Table,
    to: &Table,
    position: usize,
    names: NameMatch,
) -> (Option<String>, Option<String>) {
    let next = to.columns[position + 1..]
        .iter()
        .find_map(|c| working.column_index(&c.name, names));
    match next {
        Some(at) => (
            at.checked_sub(1).map(|p| working.columns[p].name.clone()),
            Some(working.columns[at].name.clone()),
        ),
        None => (working.columns.last().map(|c| c.name.clone()), None),
    }
}
