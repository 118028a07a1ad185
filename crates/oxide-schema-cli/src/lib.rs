//! Plan schema changes between two database model snapshots.
//!
//! The snapshots are JSON documents in the shape of
//! [`oxide_schema_core::Database`], typically dumped by a metadata reader.
//! The plan is printed as text or as JSON for a SQL renderer to consume.

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use tracing::debug;

use oxide_schema_core::{ComparatorOptions, Database, DialectKind, MigrationPlan, Planner};

/// How the plan is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per step.
    #[default]
    Text,
    /// The plan serialized as pretty-printed JSON.
    Json,
}

/// Settings for one planning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Target dialect.
    pub dialect: DialectKind,
    /// Match identifiers ignoring case.
    pub case_insensitive: bool,
    /// Output format.
    pub format: OutputFormat,
}

/// Reads a model snapshot from a JSON file.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a valid snapshot.
pub fn load_database(path: &Path) -> anyhow::Result<Database> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file {}", path.display()))?;
    let database: Database = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse model file {}", path.display()))?;
    debug!(
        path = %path.display(),
        tables = database.tables.len(),
        "Loaded model"
    );
    Ok(database)
}

/// Plans the migration from `source` to `target`.
///
/// # Errors
///
/// Fails if either model is invalid.
pub fn plan(
    source: &Database,
    target: &Database,
    options: &Options,
) -> anyhow::Result<MigrationPlan> {
    let comparator = ComparatorOptions::new().case_sensitive(!options.case_insensitive);
    let plan = Planner::new(options.dialect.dialect(), comparator)
        .plan(source, target)
        .context("Invalid model")?;
    Ok(plan)
}

/// Renders a plan in the requested format.
///
/// # Errors
///
/// Fails if JSON serialization fails.
pub fn render(plan: &MigrationPlan, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(plan.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(plan)?),
    }
}

/// Loads both snapshots, plans the migration and renders it.
///
/// # Errors
///
/// Fails if a snapshot cannot be loaded or is invalid.
pub fn run(source: &Path, target: &Path, options: &Options) -> anyhow::Result<String> {
    let source = load_database(source)?;
    let target = load_database(target)?;
    let plan = plan(&source, &target, options)?;
    render(&plan, options.format)
}
