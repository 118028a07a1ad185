//! Tests for loading snapshots and rendering plans.

use std::fs;
use std::path::PathBuf;

use oxide_schema_cli::{load_database, run, Options, OutputFormat};
use oxide_schema_core::DialectKind;
use tempfile::TempDir;

const SOURCE: &str = r#"{
    "name": "shop",
    "tables": [
        {
            "name": "users",
            "columns": [
                {"name": "id", "type": "BIGINT", "required": true, "primary_key": true},
                {"name": "name", "type": "VARCHAR", "size": 100, "required": true}
            ]
        },
        {
            "name": "audit",
            "columns": [
                {"name": "id", "type": "BIGINT", "required": true, "primary_key": true}
            ]
        }
    ]
}"#;

const TARGET: &str = r#"{
    "name": "shop",
    "tables": [
        {
            "name": "USERS",
            "columns": [
                {"name": "ID", "type": "BIGINT", "required": true, "primary_key": true},
                {"name": "NAME", "type": "VARCHAR", "size": 100, "required": true},
                {"name": "EMAIL", "type": "VARCHAR", "size": 255}
            ],
            "indexes": [
                {"name": "IDX_EMAIL", "columns": ["EMAIL"], "unique": true}
            ]
        }
    ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn options(dialect: DialectKind, format: OutputFormat) -> Options {
    Options {
        dialect,
        case_insensitive: true,
        format,
    }
}

#[test]
fn text_plan_lists_steps() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "source.json", SOURCE);
    let target = write(&dir, "target.json", TARGET);

    let output = run(
        &source,
        &target,
        &options(DialectKind::Postgres, OutputFormat::Text),
    )
    .unwrap();
    assert_eq!(
        output,
        "Migration plan (postgres, 2 steps)\n  \
         1. remove table audit\n  \
         2. alter table USERS\n    \
         add column users.EMAIL VARCHAR(255)\n    \
         add index IDX_EMAIL on users"
    );
}

#[test]
fn generic_dialect_rebuilds_for_the_index() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "source.json", SOURCE);
    let target = write(&dir, "target.json", TARGET);

    let output = run(
        &source,
        &target,
        &options(DialectKind::Generic, OutputFormat::Json),
    )
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["dialect"], "generic");
    assert_eq!(json["steps"][0]["change"]["kind"], "remove_table");
    assert_eq!(json["steps"][1]["rebuild"]["table"], "USERS");
    assert_eq!(json["steps"][1]["rebuild"]["to"]["columns"][2]["name"], "EMAIL");
}

#[test]
fn case_sensitive_run_replaces_the_table() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "source.json", SOURCE);
    let target = write(&dir, "target.json", TARGET);

    let output = run(
        &source,
        &target,
        &Options {
            case_insensitive: false,
            ..options(DialectKind::Sqlite, OutputFormat::Text)
        },
    )
    .unwrap();
    assert!(output.contains("remove table users"));
    assert!(output.contains("add table USERS (3 columns)"));
}

#[test]
fn identical_models_plan_nothing() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "source.json", SOURCE);

    let output = run(
        &source,
        &source,
        &options(DialectKind::MySql, OutputFormat::Text),
    )
    .unwrap();
    assert_eq!(output, "No changes (mysql)");
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let err = load_database(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn malformed_snapshot_is_reported() {
    let dir = TempDir::new().unwrap();
    let broken = write(&dir, "broken.json", r#"{"tables": [{"name": "t"}]}"#);

    let err = load_database(&broken).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse model file"));
}

#[test]
fn invalid_model_fails_planning() {
    let dir = TempDir::new().unwrap();
    let source = write(&dir, "source.json", SOURCE);
    let invalid = write(
        &dir,
        "invalid.json",
        r#"{"tables": [{"name": "t", "columns": [
            {"name": "id", "type": "INTEGER", "primary_key": true}
        ]}]}"#,
    );

    let err = run(
        &source,
        &invalid,
        &options(DialectKind::Generic, OutputFormat::Text),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid model");
    assert!(format!("{err:#}").contains("must be required"));
}
