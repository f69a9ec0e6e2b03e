//! Crate-wide error taxonomy.
//! Every fault here is fatal: the sync and import drivers stop at the first
//! error and leave records already written earlier in the run on disk.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    /// Two columns in one record share the same lowercased name. The record
    /// was hand-edited into an inconsistent state; rerunning will not fix it.
    #[error("{table}.{column} is defined twice")]
    DuplicateField { table: String, column: String },

    /// The importer loaded a record, computed changes, and found the file
    /// gone at write time.
    #[error("{} no longer exists", .path.display())]
    RecordVanished { path: PathBuf },

    /// The record's structure cannot be merged into, e.g. `columns` is not an
    /// array of tables or a column entry has no string `name`.
    #[error("record for {table} is malformed: {detail}")]
    MalformedRecord { table: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml_edit::TomlError),

    #[error(transparent)]
    Db(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Workbook(#[from] calamine::XlsxError),
}
