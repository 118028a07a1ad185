//! oxide-schema CLI
//!
//! Compares two model snapshots and prints the migration plan.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oxide_schema_cli::{run, Options, OutputFormat};
use oxide_schema_core::DialectKind;

/// Plan schema changes between two database model snapshots.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Current model (JSON snapshot).
    source: PathBuf,

    /// Desired model (JSON snapshot).
    target: PathBuf,

    /// Target dialect: generic, sqlite, postgres, mysql or derby.
    #[arg(short, long, env = "OXIDE_SCHEMA_DIALECT", default_value = "generic")]
    dialect: DialectKind,

    /// Match table, column and constraint names ignoring case.
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = Options {
        dialect: cli.dialect,
        case_insensitive: cli.case_insensitive,
        format: cli.format,
    };
    let output = run(&cli.source, &cli.target, &options)?;
    println!("{output}");
    Ok(())
}
