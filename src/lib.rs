//!
//! schemadoc
//! ---------
//! Keeps hand-written documentation for a relational schema in sync with the
//! schema itself. One `<table>.table.toml` record per table mixes reflected
//! structure (column list, simplified types, primary key) with human-authored
//! descriptions. Two batch passes maintain the records:
//!
//! - Reflection sync: reads table/column/foreign-key metadata from a live
//!   Postgres connection and merges it into the records, creating files for
//!   newly seen tables.
//! - Spreadsheet import: pulls column descriptions out of an Excel workbook
//!   and fills them into records that already exist.
//!
//! Descriptions use the literal placeholder `TODO` to mean "not written yet";
//! that sentinel is the only description value the mergers will overwrite.
//! Everything a person typed (including comments and key order in the TOML
//! files) survives every pass. When both passes run, reflection is expected
//! to run first so foreign-key derived descriptions win over imported text.

pub mod error;
pub mod typemap;
pub mod record;
pub mod inspect;
pub mod sync;
pub mod import;
