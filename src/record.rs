//!
//! schemadoc record store
//! ----------------------
//! One TOML document per table under the output folder, named
//! `<lowercased_table>.table.toml`. Records are edited in place through
//! `toml_edit`, so comments, key order, and formatting a person added survive
//! every automated pass, and keys the mergers know nothing about (such as
//! `dialect_info`) round-trip untouched. The store is also the single place
//! that decides whether a merge actually changed anything: serializations are
//! compared as text, and an identical rendering means no write happens.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use toml_edit::{ArrayOfTables, DocumentMut, Item};

use crate::error::DocError;

/// The placeholder meaning "no human has written this yet". It is the only
/// description value automated merges may replace, and it is stored literally
/// so readers of the raw files see it too.
pub const TODO: &str = "TODO";

/// Handle to the folder of `*.table.toml` records.
#[derive(Clone)]
pub struct DocStore {
    root: PathBuf,
}

/// What a save call did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl DocStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root_path(&self) -> &PathBuf { &self.root }

    /// Path of the record for a lowercased table key.
    pub fn record_path(&self, table_key: &str) -> PathBuf {
        self.root.join(format!("{table_key}.table.toml"))
    }

    /// Load the raw text and parsed document for a table, if its record
    /// exists. The raw text is kept alongside the parse so a no-op merge can
    /// be detected by plain string comparison later.
    pub fn load(&self, table_key: &str) -> Result<Option<(String, DocumentMut)>, DocError> {
        let path = self.record_path(table_key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let doc: DocumentMut = text.parse()?;
        Ok(Some((text, doc)))
    }

    /// Write the record back if its serialization differs from `original`
    /// (`None` when no file existed before). The output folder is created on
    /// first write.
    pub fn save_if_changed(
        &self,
        table_key: &str,
        original: Option<&str>,
        doc: &DocumentMut,
    ) -> Result<WriteOutcome, DocError> {
        let rendered = doc.to_string();
        if original == Some(rendered.as_str()) {
            return Ok(WriteOutcome::Unchanged);
        }
        let path = self.record_path(table_key);
        let outcome = if path.exists() {
            WriteOutcome::Updated
        } else {
            fs::create_dir_all(&self.root)?;
            WriteOutcome::Created
        };
        fs::write(&path, rendered)?;
        Ok(outcome)
    }

    /// Like `save_if_changed` for callers that already asserted the record
    /// exists: a file missing at write time is a fatal inconsistency, not a
    /// create.
    pub fn update_existing(
        &self,
        table_key: &str,
        original: &str,
        doc: &DocumentMut,
    ) -> Result<WriteOutcome, DocError> {
        let rendered = doc.to_string();
        if rendered == original {
            return Ok(WriteOutcome::Unchanged);
        }
        let path = self.record_path(table_key);
        if !path.exists() {
            return Err(DocError::RecordVanished { path });
        }
        fs::write(&path, rendered)?;
        Ok(WriteOutcome::Updated)
    }
}

/// Identity map of a record's columns: lowercased column name to position in
/// the `columns` array. Two columns sharing a key means the record was edited
/// into an inconsistent state, which aborts the run.
pub fn column_index(
    table_label: &str,
    columns: &ArrayOfTables,
) -> Result<IndexMap<String, usize>, DocError> {
    let mut index = IndexMap::new();
    for (pos, column) in columns.iter().enumerate() {
        let name = column.get("name").and_then(Item::as_str).ok_or_else(|| {
            DocError::MalformedRecord {
                table: table_label.to_string(),
                detail: format!("column entry {pos} has no string `name`"),
            }
        })?;
        let key = name.to_lowercase();
        if index.insert(key.clone(), pos).is_some() {
            return Err(DocError::DuplicateField {
                table: table_label.to_string(),
                column: key,
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml_edit::value;

    #[test]
    fn record_path_uses_lowercased_key_and_extension() {
        let store = DocStore::new("/tmp/docs");
        assert_eq!(
            store.record_path("users"),
            PathBuf::from("/tmp/docs/users.table.toml")
        );
    }

    #[test]
    fn load_returns_none_for_missing_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocStore::new(tmp.path());
        assert!(store.load("users").unwrap().is_none());
    }

    #[test]
    fn save_creates_folder_and_reports_outcomes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocStore::new(tmp.path().join("nested").join("tables"));
        let mut doc = DocumentMut::new();
        doc["name"] = value("Users");
        assert_eq!(
            store.save_if_changed("users", None, &doc).unwrap(),
            WriteOutcome::Created
        );
        let (text, mut doc) = store.load("users").unwrap().unwrap();
        assert_eq!(
            store.save_if_changed("users", Some(&text), &doc).unwrap(),
            WriteOutcome::Unchanged
        );
        doc["description"] = value("Core roster");
        assert_eq!(
            store.save_if_changed("users", Some(&text), &doc).unwrap(),
            WriteOutcome::Updated
        );
    }

    #[test]
    fn update_existing_requires_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocStore::new(tmp.path());
        let mut doc = DocumentMut::new();
        doc["name"] = value("Users");
        let err = store.update_existing("users", "", &doc).unwrap_err();
        assert!(matches!(err, DocError::RecordVanished { .. }));
    }

    #[test]
    fn column_index_rejects_case_colliding_names() {
        let text = "[[columns]]\nname = \"Id\"\n\n[[columns]]\nname = \"ID\"\n";
        let doc: DocumentMut = text.parse().unwrap();
        let columns = doc["columns"].as_array_of_tables().unwrap();
        let err = column_index("Users", columns).unwrap_err();
        assert_eq!(err.to_string(), "Users.id is defined twice");
    }
}
