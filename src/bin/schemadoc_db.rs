//!
//! schemadoc reflection sync binary
//! --------------------------------
//! Command-line entry point for reflecting a live Postgres schema into
//! per-table documentation records. Supports configuration via CLI flags and
//! environment variables.

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use schemadoc::inspect::{connect, Inspector};
use schemadoc::record::DocStore;
use schemadoc::sync::sync_schema_to_disk;

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

fn parse_bool_env(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(v) => {
            let s = v.to_lowercase();
            match s.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        }
        Err(_) => None,
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("schemadoc reflection sync\n\nUSAGE:\n  schemadoc_db --url URL [--schema NAME] [--out DIR] [--update-only]\n\nOPTIONS:\n  --url URL        Postgres connection URL (env: SCHEMADOC_DB_URL)\n  --schema NAME    Schema to reflect (env: SCHEMADOC_SCHEMA, default public)\n  --out DIR        Record folder (env: SCHEMADOC_OUT, default docs/tables)\n  --update-only    Only refresh existing records, never create new ones (env: SCHEMADOC_UPDATE_ONLY)\n");
        return Ok(());
    }

    let url = parse_str_arg(&args, "--url")
        .or_else(|| env::var("SCHEMADOC_DB_URL").ok())
        .ok_or_else(|| anyhow!("missing --url (or SCHEMADOC_DB_URL)"))?;
    let schema = parse_str_arg(&args, "--schema").or_else(|| env::var("SCHEMADOC_SCHEMA").ok());
    let out = parse_str_arg(&args, "--out")
        .or_else(|| env::var("SCHEMADOC_OUT").ok())
        .unwrap_or_else(|| "docs/tables".to_string());
    let update_only =
        has_flag(&args, "--update-only") || parse_bool_env("SCHEMADOC_UPDATE_ONLY").unwrap_or(false);

    let client = connect(&url).await?;
    let inspector = Inspector::new(&client, schema.as_deref());
    let store = DocStore::new(&out);
    info!(
        "Reflecting schema {} into {}",
        inspector.schema(),
        store.root_path().display()
    );
    let stats = sync_schema_to_disk(&inspector, &store, update_only).await?;
    info!(
        "Sync finished: {} created, {} updated, {} unchanged, {} skipped",
        stats.created, stats.updated, stats.unchanged, stats.skipped
    );
    Ok(())
}
