//!
//! schemadoc workbook import binary
//! --------------------------------
//! Command-line entry point for importing column descriptions from an Excel
//! workbook into existing documentation records. Supports configuration via
//! CLI flags and environment variables.

use anyhow::{anyhow, Result};
use std::env;
use std::path::Path;
use tracing::info;

use schemadoc::import::{import_workbook, ImportHeaders};
use schemadoc::record::DocStore;

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_or_env(args: &[String], flag: &str, env_name: &str, default: &str) -> String {
    parse_str_arg(args, flag)
        .or_else(|| env::var(env_name).ok())
        .unwrap_or_else(|| default.to_string())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("schemadoc workbook import\n\nUSAGE:\n  schemadoc_excel --workbook PATH [--table-header H] [--field-header H] [--descr-header H] [--out DIR]\n\nOPTIONS:\n  --workbook PATH    Excel workbook to read (env: SCHEMADOC_WORKBOOK)\n  --table-header H   Header naming the table column (env: SCHEMADOC_TABLE_HEADER, default table)\n  --field-header H   Header naming the field column (env: SCHEMADOC_FIELD_HEADER, default field)\n  --descr-header H   Header naming the description column (env: SCHEMADOC_DESCR_HEADER, default description)\n  --out DIR          Record folder (env: SCHEMADOC_OUT, default docs/tables)\n");
        return Ok(());
    }

    let workbook = parse_str_arg(&args, "--workbook")
        .or_else(|| env::var("SCHEMADOC_WORKBOOK").ok())
        .ok_or_else(|| anyhow!("missing --workbook (or SCHEMADOC_WORKBOOK)"))?;
    let headers = ImportHeaders {
        table: arg_or_env(&args, "--table-header", "SCHEMADOC_TABLE_HEADER", "table"),
        field: arg_or_env(&args, "--field-header", "SCHEMADOC_FIELD_HEADER", "field"),
        description: arg_or_env(&args, "--descr-header", "SCHEMADOC_DESCR_HEADER", "description"),
    };
    let out = arg_or_env(&args, "--out", "SCHEMADOC_OUT", "docs/tables");

    let store = DocStore::new(&out);
    info!(
        "Importing descriptions from {} into {}",
        workbook,
        store.root_path().display()
    );
    let stats = import_workbook(&store, Path::new(&workbook), &headers)?;
    info!(
        "Import finished: {} updated, {} unchanged, {} skipped",
        stats.updated, stats.unchanged, stats.skipped
    );
    Ok(())
}
