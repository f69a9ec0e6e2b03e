//!
//! Spreadsheet description import
//! ------------------------------
//! Pulls column descriptions out of an Excel workbook and fills them into
//! records that already exist on disk. Any sheet whose first row carries the
//! three expected headers contributes; other sheets are ignored. The importer
//! is strictly narrower than reflection sync: it never creates records, never
//! creates columns, and only writes descriptions that are still unwritten
//! (absent or the `TODO` placeholder). Run it after reflection sync so
//! foreign-key derived text is already in place.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use indexmap::IndexMap;
use toml_edit::{value, DocumentMut, Item};
use tracing::info;

use crate::error::DocError;
use crate::record::{column_index, DocStore, WriteOutcome, TODO};

/// The headers naming the three columns the importer reads. Matching is
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct ImportHeaders {
    pub table: String,
    pub field: String,
    pub description: String,
}

impl Default for ImportHeaders {
    fn default() -> Self {
        Self {
            table: "table".to_string(),
            field: "field".to_string(),
            description: "description".to_string(),
        }
    }
}

/// Pending `(lowercased field, description)` entries per lowercased table
/// key, in sheet-then-row order.
pub type DescriptionsByTable = IndexMap<String, Vec<(String, String)>>;

/// Counters for one import run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStats {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Read a workbook and apply its descriptions to the records under `store`.
pub fn import_workbook(
    store: &DocStore,
    workbook_path: &Path,
    headers: &ImportHeaders,
) -> Result<ImportStats, DocError> {
    let accumulated = read_workbook(workbook_path, headers)?;
    apply_descriptions(store, &accumulated)
}

/// Extraction phase: walk every sheet and accumulate description entries
/// keyed by table.
pub fn read_workbook(
    path: &Path,
    headers: &ImportHeaders,
) -> Result<DescriptionsByTable, DocError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let mut accumulated = DescriptionsByTable::new();
    let sheet_names = workbook.sheet_names().to_owned();
    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name)?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        collect_rows(&sheet_name, &rows, headers, &mut accumulated);
    }
    Ok(accumulated)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Header-qualify one sheet and accumulate its description rows. Split from
/// the workbook walk so it runs on plain rows.
pub fn collect_rows(
    sheet_name: &str,
    rows: &[Vec<String>],
    headers: &ImportHeaders,
    accumulated: &mut DescriptionsByTable,
) {
    let header_row = match rows.first() {
        Some(row) => row,
        None => {
            info!("Skipping {} because it does not have valid headers", sheet_name);
            return;
        }
    };
    let lowered: Vec<String> = header_row.iter().map(|cell| cell.to_lowercase()).collect();
    let position = |name: &str| {
        let wanted = name.to_lowercase();
        lowered.iter().position(|cell| *cell == wanted)
    };
    let (table_idx, field_idx, descr_idx) = match (
        position(&headers.table),
        position(&headers.field),
        position(&headers.description),
    ) {
        (Some(t), Some(f), Some(d)) => (t, f, d),
        _ => {
            info!("Skipping {} because it does not have valid headers", sheet_name);
            return;
        }
    };
    for row in &rows[1..] {
        let description = row.get(descr_idx).map(String::as_str).unwrap_or("");
        if description.is_empty() {
            continue;
        }
        let table_key = row.get(table_idx).map(String::as_str).unwrap_or("").to_lowercase();
        let field_key = row.get(field_idx).map(String::as_str).unwrap_or("").to_lowercase();
        accumulated
            .entry(table_key)
            .or_default()
            .push((field_key, description.to_string()));
    }
}

/// Merge phase: fill accumulated descriptions into existing records. Tables
/// without a record or without columns are skipped, never created.
pub fn apply_descriptions(
    store: &DocStore,
    accumulated: &DescriptionsByTable,
) -> Result<ImportStats, DocError> {
    let mut stats = ImportStats::default();
    for (table_key, entries) in accumulated {
        let (original, mut doc) = match store.load(table_key)? {
            Some(loaded) => loaded,
            None => {
                info!(
                    "Skipping {} because {} was not found",
                    table_key,
                    store.record_path(table_key).display()
                );
                stats.skipped += 1;
                continue;
            }
        };
        if !doc.contains_key("columns") {
            info!("Skipping {} because its record has no columns attribute", table_key);
            stats.skipped += 1;
            continue;
        }
        merge_descriptions(&mut doc, table_key, entries)?;
        let path = store.record_path(table_key);
        match store.update_existing(table_key, &original, &doc)? {
            WriteOutcome::Unchanged => {
                info!("No changes to {} from workbook", path.display());
                stats.unchanged += 1;
            }
            _ => {
                info!("Updating {} from workbook", path.display());
                stats.updated += 1;
            }
        }
    }
    Ok(stats)
}

/// Merge accumulated `(field, description)` pairs into a record's columns.
/// Fields the record does not know are dropped: this importer documents
/// columns, it does not invent them.
pub fn merge_descriptions(
    doc: &mut DocumentMut,
    table_key: &str,
    entries: &[(String, String)],
) -> Result<(), DocError> {
    let columns = doc["columns"].as_array_of_tables_mut().ok_or_else(|| {
        DocError::MalformedRecord {
            table: table_key.to_string(),
            detail: "`columns` is not an array of tables".to_string(),
        }
    })?;
    let existing = column_index(table_key, columns)?;
    for (field, description) in entries {
        let pos = match existing.get(field.to_lowercase().as_str()) {
            Some(pos) => *pos,
            None => continue,
        };
        let column = match columns.get_mut(pos) {
            Some(column) => column,
            None => continue,
        };
        let current = column.get("description").and_then(Item::as_str);
        if current.is_none() || current == Some(TODO) {
            set_description(column, description.trim());
        }
    }
    Ok(())
}

fn set_description(column: &mut toml_edit::Table, text: &str) {
    if column.get("description").and_then(Item::as_str) != Some(text) {
        column["description"] = value(text);
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod import_tests;
