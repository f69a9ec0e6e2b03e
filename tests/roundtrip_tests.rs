//! End-to-end record behavior on disk: byte-stable no-op merges, comment
//! preservation across real updates, and the importer's existence contract.

use std::fs;

use schemadoc::import::{apply_descriptions, DescriptionsByTable};
use schemadoc::inspect::{ColumnInfo, ForeignKeyInfo, TableReflection};
use schemadoc::record::{DocStore, WriteOutcome};
use schemadoc::sync::sync_one_table;

fn col(name: &str, raw_type: &str) -> ColumnInfo {
    ColumnInfo { name: name.to_string(), raw_type: raw_type.to_string() }
}

const USERS_RECORD: &str = "\
# Reviewed 2024-03-12
name = \"Users\"
description = \"Everyone who can sign in\"
primary_key = [\"Id\"]

[[columns]]
name = \"Id\"
type = \"integer\"
description = \"Surrogate key\"

[[columns]]
name = \"Email\"
type = \"string\"
description = \"TODO\"
";

fn entries_for(table: &str, field: &str, text: &str) -> DescriptionsByTable {
    let mut accumulated = DescriptionsByTable::new();
    accumulated.insert(
        table.to_string(),
        vec![(field.to_string(), text.to_string())],
    );
    accumulated
}

#[test]
fn noop_reflection_merge_leaves_bytes_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());
    fs::write(store.record_path("users"), USERS_RECORD).unwrap();

    let reflection = TableReflection {
        primary_key: vec!["Id".to_string()],
        columns: vec![col("Id", "integer"), col("Email", "varchar")],
        foreign_keys: vec![],
    };
    let outcome = sync_one_table(&store, "Users", &reflection, false).unwrap();

    assert_eq!(outcome, Some(WriteOutcome::Unchanged));
    assert_eq!(
        fs::read_to_string(store.record_path("users")).unwrap(),
        USERS_RECORD
    );
}

#[test]
fn comments_survive_a_real_update() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());
    fs::write(store.record_path("users"), USERS_RECORD).unwrap();

    let reflection = TableReflection {
        primary_key: vec!["Id".to_string()],
        columns: vec![
            col("Id", "uuid"),
            col("Email", "varchar"),
            col("CreatedAt", "timestamptz"),
        ],
        foreign_keys: vec![],
    };
    let outcome = sync_one_table(&store, "Users", &reflection, false).unwrap();
    assert_eq!(outcome, Some(WriteOutcome::Updated));

    let text = fs::read_to_string(store.record_path("users")).unwrap();
    assert!(text.contains("# Reviewed 2024-03-12"));
    assert!(text.contains("type = \"uuid\""));
    assert!(text.contains("description = \"Surrogate key\""));
    assert!(text.contains("name = \"CreatedAt\""));
}

#[test]
fn reflection_run_is_idempotent_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path().join("tables"));

    let reflection = TableReflection {
        primary_key: vec!["Id".to_string()],
        columns: vec![col("Id", "bigint"), col("OrderId", "bigint")],
        foreign_keys: vec![ForeignKeyInfo {
            constrained_columns: vec!["OrderId".to_string()],
            referred_table: "Orders".to_string(),
            referred_columns: vec!["OrderId".to_string()],
        }],
    };
    assert_eq!(
        sync_one_table(&store, "LineItems", &reflection, false).unwrap(),
        Some(WriteOutcome::Created)
    );
    let first = fs::read_to_string(store.record_path("lineitems")).unwrap();

    assert_eq!(
        sync_one_table(&store, "LineItems", &reflection, false).unwrap(),
        Some(WriteOutcome::Unchanged)
    );
    assert_eq!(
        fs::read_to_string(store.record_path("lineitems")).unwrap(),
        first
    );
}

#[test]
fn update_only_never_creates_records() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());

    let reflection = TableReflection {
        primary_key: vec!["Id".to_string()],
        columns: vec![col("Id", "bigint")],
        foreign_keys: vec![],
    };
    let outcome = sync_one_table(&store, "Ghost", &reflection, true).unwrap();

    assert_eq!(outcome, None);
    assert!(!store.record_path("ghost").exists());
}

#[test]
fn import_requires_an_existing_record() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());

    let stats =
        apply_descriptions(&store, &entries_for("users", "email", "Login address")).unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.updated, 0);
    assert!(!store.record_path("users").exists());
}

#[test]
fn import_fills_todo_then_respects_the_written_text() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());
    fs::write(store.record_path("users"), USERS_RECORD).unwrap();

    let stats =
        apply_descriptions(&store, &entries_for("users", "email", "Login address")).unwrap();
    assert_eq!(stats.updated, 1);
    let text = fs::read_to_string(store.record_path("users")).unwrap();
    assert!(text.contains("description = \"Login address\""));
    assert!(text.contains("# Reviewed 2024-03-12"));

    let stats =
        apply_descriptions(&store, &entries_for("users", "email", "Different text")).unwrap();
    assert_eq!(stats.unchanged, 1);
    let text = fs::read_to_string(store.record_path("users")).unwrap();
    assert!(text.contains("description = \"Login address\""));
}

#[test]
fn reflection_text_wins_over_a_later_import() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DocStore::new(tmp.path());

    let reflection = TableReflection {
        primary_key: vec!["Id".to_string()],
        columns: vec![col("Id", "bigint"), col("OrderId", "bigint")],
        foreign_keys: vec![ForeignKeyInfo {
            constrained_columns: vec!["OrderId".to_string()],
            referred_table: "Orders".to_string(),
            referred_columns: vec!["OrderId".to_string()],
        }],
    };
    sync_one_table(&store, "LineItems", &reflection, false).unwrap();

    let stats =
        apply_descriptions(&store, &entries_for("lineitems", "orderid", "Spreadsheet text"))
            .unwrap();
    assert_eq!(stats.unchanged, 1);
    let text = fs::read_to_string(store.record_path("lineitems")).unwrap();
    assert!(text.contains("description = \"References Orders.OrderId.\""));
}
