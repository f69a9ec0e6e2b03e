//!
//! Schema reflection sync
//! ----------------------
//! Merges live reflection into the per-table records. Structure is refreshed
//! on every run (column list, simplified types, casing of names); prose is
//! not: descriptions are only filled while they still carry the `TODO`
//! placeholder, and a primary key written once is never replaced. Foreign
//! keys turn unwritten descriptions into "References Table.Column." text so a
//! field only needs documenting in the table where it lives as a key.
//!
//! Every assignment is suppressed when the stored value already matches, so a
//! merge that learns nothing renders byte-identically and no file is touched.

use indexmap::IndexMap;
use toml_edit::{value, Array, ArrayOfTables, DocumentMut, Item, Table, Value};
use tracing::info;

use crate::error::DocError;
use crate::inspect::{Inspector, TableReflection};
use crate::record::{column_index, DocStore, WriteOutcome, TODO};
use crate::typemap::simplify_type;

/// Counters for one sync run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Reflect every base table in the inspector's schema into `store`, one
/// record per table, writing only the records the merge changed. With
/// `update_only`, tables without an existing record are skipped before any
/// per-table reflection queries run.
pub async fn sync_schema_to_disk(
    inspector: &Inspector<'_>,
    store: &DocStore,
    update_only: bool,
) -> Result<SyncStats, DocError> {
    let mut stats = SyncStats::default();
    for cased_table_name in inspector.table_names().await? {
        let table_key = cased_table_name.to_lowercase();
        if update_only && !store.record_path(&table_key).exists() {
            info!("Skipping {} because update_only is enabled", cased_table_name);
            stats.skipped += 1;
            continue;
        }
        let reflection = inspector.reflect_table(&cased_table_name).await?;
        match sync_one_table(store, &cased_table_name, &reflection, update_only)? {
            None => stats.skipped += 1,
            Some(WriteOutcome::Created) => stats.created += 1,
            Some(WriteOutcome::Updated) => stats.updated += 1,
            Some(WriteOutcome::Unchanged) => stats.unchanged += 1,
        }
    }
    Ok(stats)
}

/// Sync one table's reflection into the store. Returns `None` when the table
/// was skipped because `update_only` found no existing record.
pub fn sync_one_table(
    store: &DocStore,
    cased_table_name: &str,
    reflection: &TableReflection,
    update_only: bool,
) -> Result<Option<WriteOutcome>, DocError> {
    let table_key = cased_table_name.to_lowercase();
    let (original, mut doc) = match store.load(&table_key)? {
        Some((text, doc)) => (Some(text), doc),
        None if update_only => {
            info!("Skipping {} because update_only is enabled", cased_table_name);
            return Ok(None);
        }
        None => (None, DocumentMut::new()),
    };
    merge_table_reflection(&mut doc, cased_table_name, reflection, update_only)?;
    let outcome = store.save_if_changed(&table_key, original.as_deref(), &doc)?;
    let path = store.record_path(&table_key);
    match outcome {
        WriteOutcome::Created => info!("Creating {} from {}", path.display(), cased_table_name),
        WriteOutcome::Updated => info!("Updating {} from {}", path.display(), cased_table_name),
        WriteOutcome::Unchanged => {
            info!("No changes to {} from {}", path.display(), cased_table_name)
        }
    }
    Ok(Some(outcome))
}

/// Merge one table's reflection into its record. Touches only the document;
/// persistence and the changed/unchanged decision stay with the store.
pub fn merge_table_reflection(
    doc: &mut DocumentMut,
    cased_table_name: &str,
    reflection: &TableReflection,
    update_only: bool,
) -> Result<(), DocError> {
    let table_key = cased_table_name.to_lowercase();
    let root = doc.as_table_mut();

    // Table attributes. `name` tracks the cased spelling the database
    // reports; the file name stays the lowercased key.
    if root.get("name").and_then(Item::as_str).is_none() || cased_table_name != table_key {
        set_string(root, "name", cased_table_name);
    }
    if !root.contains_key("description") {
        root["description"] = value(TODO);
    }
    let pk_unset = root
        .get("primary_key")
        .and_then(Item::as_array)
        .map_or(true, Array::is_empty);
    if pk_unset {
        set_string_seq(root, "primary_key", &reflection.primary_key);
    }
    if !root.contains_key("columns") {
        root["columns"] = Item::ArrayOfTables(ArrayOfTables::new());
    }

    // Collect "ReferredTable.ReferredColumn" strings per lowercased local
    // column, in the order the constraints reflect.
    let mut refs_by_col: IndexMap<String, Vec<String>> = IndexMap::new();
    for fk in &reflection.foreign_keys {
        for (cased_col, referred_col) in fk.constrained_columns.iter().zip(&fk.referred_columns) {
            refs_by_col
                .entry(cased_col.to_lowercase())
                .or_default()
                .push(format!("{}.{}", fk.referred_table, referred_col));
        }
    }

    let columns = root["columns"].as_array_of_tables_mut().ok_or_else(|| {
        DocError::MalformedRecord {
            table: table_key.clone(),
            detail: "`columns` is not an array of tables".to_string(),
        }
    })?;
    let existing = column_index(cased_table_name, columns)?;

    for col in &reflection.columns {
        let col_key = col.name.to_lowercase();
        if let Some(pos) = existing.get(col_key.as_str()).copied() {
            if let Some(entry) = columns.get_mut(pos) {
                merge_column(entry, &col.name, &col_key, &col.raw_type, &refs_by_col);
            }
        } else if update_only {
            info!(
                "Skipping {}.{} because update_only is enabled",
                cased_table_name, col.name
            );
        } else {
            let mut entry = Table::new();
            merge_column(&mut entry, &col.name, &col_key, &col.raw_type, &refs_by_col);
            columns.push(entry);
        }
    }
    Ok(())
}

/// Column-level merge rules; `entry` is either a column loaded from the
/// record or a fresh template about to be appended.
fn merge_column(
    entry: &mut Table,
    cased_name: &str,
    col_key: &str,
    raw_type: &str,
    refs_by_col: &IndexMap<String, Vec<String>>,
) {
    if entry.get("name").and_then(Item::as_str).is_none() || cased_name != col_key {
        set_string(entry, "name", cased_name);
    }
    set_string(entry, "type", &simplify_type(raw_type));
    if !entry.contains_key("description") {
        entry["description"] = value(TODO);
    }
    if entry.get("description").and_then(Item::as_str) == Some(TODO) {
        if let Some(refs) = refs_by_col.get(col_key) {
            set_string(entry, "description", &format!("References {}.", refs.join(", ")));
        }
    }
}

/// Assign only when the stored value differs, so untouched records render
/// byte-identically and the store skips the write.
fn set_string(table: &mut Table, key: &str, val: &str) {
    if table.get(key).and_then(Item::as_str) != Some(val) {
        table[key] = value(val);
    }
}

fn set_string_seq(table: &mut Table, key: &str, vals: &[String]) {
    let current: Option<Vec<&str>> = table
        .get(key)
        .and_then(Item::as_array)
        .map(|array| array.iter().filter_map(Value::as_str).collect());
    let wanted: Vec<&str> = vals.iter().map(String::as_str).collect();
    if current.as_deref() != Some(wanted.as_slice()) {
        let array: Array = vals.iter().map(String::as_str).collect();
        table[key] = value(array);
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
