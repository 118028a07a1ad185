//! Migration planning.
//!
//! The [`Planner`] is the caller the comparator reports to: it validates
//! both models, runs the comparison and turns every batch the dialect
//! cannot apply in place into a table rebuild directive.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::change::Change;
use crate::diff::{ComparatorOptions, ModelComparator, TableBatch};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::model::{Database, Table};

/// Rebuild a table by creating the target shape, copying the rows and
/// swapping it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRebuild {
    /// Table name.
    pub table: String,
    /// The table as it stands before the rebuild.
    pub from: Table,
    /// The table to rebuild into.
    pub to: Table,
}

/// One step of a [`MigrationPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStep {
    /// Alter a table in place, applying the batch in order.
    Alter(TableBatch),
    /// Rebuild a table.
    Rebuild(TableRebuild),
    /// A change outside any table batch: table creation or removal, and
    /// the foreign keys of new tables.
    Change(Change),
}

impl PlanStep {
    /// Name of the table the step applies to.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Alter(batch) => &batch.table,
            Self::Rebuild(rebuild) => &rebuild.table,
            Self::Change(change) => change.table_name(),
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alter(batch) => {
                write!(f, "alter table {}", batch.table)?;
                for change in &batch.changes {
                    write!(f, "\n    {change}")?;
                }
                Ok(())
            }
            Self::Rebuild(rebuild) => write!(f, "rebuild table {}", rebuild.table),
            Self::Change(change) => write!(f, "{change}"),
        }
    }
}

/// An ordered migration plan for one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Name of the dialect the plan was made for.
    pub dialect: String,
    /// Steps in execution order.
    pub steps: Vec<PlanStep>,
}

impl MigrationPlan {
    /// Returns the steps.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Returns `true` if the models already match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Number of tables that must be rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, PlanStep::Rebuild(_)))
            .count()
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "No changes ({})", self.dialect);
        }
        write!(f, "Migration plan ({}, {} steps)", self.dialect, self.steps.len())?;
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "\n{:>3}. {step}", i + 1)?;
        }
        Ok(())
    }
}

/// Plans migrations for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    dialect: &'a dyn Dialect,
    options: ComparatorOptions,
}

impl<'a> Planner<'a> {
    /// Creates a planner.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, options: ComparatorOptions) -> Self {
        Self { dialect, options }
    }

    /// Plans the migration from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`](crate::ModelError) if either model is
    /// invalid. The source model is checked first.
    pub fn plan(&self, source: &Database, target: &Database) -> Result<MigrationPlan> {
        source.validate(self.options.names)?;
        target.validate(self.options.names)?;

        let comparison = ModelComparator::new(self.dialect, self.options).compare(source, target);

        let mut steps = Vec::new();
        steps.extend(comparison.table_removals.into_iter().map(PlanStep::Change));
        steps.extend(comparison.table_additions.into_iter().map(PlanStep::Change));
        for batch in comparison.table_batches {
            if batch.supported {
                steps.push(PlanStep::Alter(batch));
            } else {
                steps.push(PlanStep::Rebuild(TableRebuild {
                    table: batch.table,
                    from: batch.intermediate,
                    to: batch.target,
                }));
            }
        }
        steps.extend(
            comparison
                .foreign_key_additions
                .into_iter()
                .map(PlanStep::Change),
        );

        let plan = MigrationPlan {
            dialect: self.dialect.name().to_string(),
            steps,
        };
        info!(
            dialect = %plan.dialect,
            steps = plan.len(),
            rebuilds = plan.rebuild_count(),
            "Planned migration"
        );
        Ok(plan)
    }
}
