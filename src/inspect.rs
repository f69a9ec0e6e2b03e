//!
//! Live-database reflection
//! ------------------------
//! Schema-scoped lookups against the Postgres catalogs, shaped the way the
//! reflection merger consumes them. Identifier columns are cast to `text` in
//! SQL because the `information_schema` domains do not map to Rust strings
//! directly. The provider also normalizes the catalog's verbose type
//! spellings into the generic identifiers the documentation vocabulary is
//! written in.

use indexmap::IndexMap;
use tokio_postgres::{Client, Config, NoTls};

use crate::error::DocError;

/// One reflected column: display-cased name plus the raw dialect type
/// identifier fed to the type simplifier.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub raw_type: String,
}

/// One foreign-key constraint. Local and referred columns pair up by
/// position.
#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub constrained_columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// Everything the reflection merger needs to know about one table.
#[derive(Debug, Clone, Default)]
pub struct TableReflection {
    pub primary_key: Vec<String>,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Connect to Postgres and drive the connection from a background task so the
/// caller can run queries sequentially.
pub async fn connect(url: &str) -> Result<Client, DocError> {
    let cfg: Config = url.parse()?;
    let (client, conn) = cfg.connect(NoTls).await?;
    tokio::spawn(async move {
        let _ = conn.await;
    });
    Ok(client)
}

/// Reflection provider over a live Postgres connection, scoped to one schema.
pub struct Inspector<'a> {
    client: &'a Client,
    schema: String,
}

impl<'a> Inspector<'a> {
    /// `schema` falls back to `public`, the Postgres default.
    pub fn new(client: &'a Client, schema: Option<&str>) -> Self {
        Self { client, schema: schema.unwrap_or("public").to_string() }
    }

    pub fn schema(&self) -> &str { &self.schema }

    /// Base-table names in the schema, in name order.
    pub async fn table_names(&self) -> Result<Vec<String>, DocError> {
        let rows = self
            .client
            .query(
                "SELECT table_name::text \
                 FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                &[&self.schema],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Primary-key columns in key order; empty when the table has none.
    pub async fn primary_key(&self, table: &str) -> Result<Vec<String>, DocError> {
        let rows = self
            .client
            .query(
                "SELECT kcu.column_name::text \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON kcu.constraint_name = tc.constraint_name \
                  AND kcu.constraint_schema = tc.constraint_schema \
                 WHERE tc.table_schema = $1 AND tc.table_name = $2 \
                   AND tc.constraint_type = 'PRIMARY KEY' \
                 ORDER BY kcu.ordinal_position",
                &[&self.schema, &table],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Columns with raw type identifiers, in ordinal order.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DocError> {
        let rows = self
            .client
            .query(
                "SELECT c.column_name::text, c.data_type::text, c.udt_name::text, \
                        (SELECT t.typtype::text \
                           FROM pg_type t \
                           JOIN pg_namespace tn ON tn.oid = t.typnamespace \
                          WHERE t.typname = c.udt_name AND tn.nspname = c.udt_schema) \
                 FROM information_schema.columns c \
                 WHERE c.table_schema = $1 AND c.table_name = $2 \
                 ORDER BY c.ordinal_position",
                &[&self.schema, &table],
            )
            .await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get(0);
            let data_type: String = row.get(1);
            let udt_name: String = row.get(2);
            let typtype: Option<String> = row.get(3);
            columns.push(ColumnInfo {
                name,
                raw_type: raw_type_ident(&data_type, &udt_name, typtype.as_deref()),
            });
        }
        Ok(columns)
    }

    /// Foreign-key constraints with positionally paired columns, grouped per
    /// constraint in catalog order.
    pub async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>, DocError> {
        let rows = self
            .client
            .query(
                "SELECT con.conname::text, la.attname::text, ref_cl.relname::text, ra.attname::text \
                 FROM pg_constraint con \
                 JOIN pg_class cl ON cl.oid = con.conrelid \
                 JOIN pg_namespace ns ON ns.oid = cl.relnamespace \
                 JOIN pg_class ref_cl ON ref_cl.oid = con.confrelid \
                 CROSS JOIN LATERAL unnest(con.conkey, con.confkey) \
                      WITH ORDINALITY AS pairing(attnum, fattnum, ord) \
                 JOIN pg_attribute la \
                   ON la.attrelid = con.conrelid AND la.attnum = pairing.attnum \
                 JOIN pg_attribute ra \
                   ON ra.attrelid = con.confrelid AND ra.attnum = pairing.fattnum \
                 WHERE con.contype = 'f' AND ns.nspname = $1 AND cl.relname = $2 \
                 ORDER BY con.conname, pairing.ord",
                &[&self.schema, &table],
            )
            .await?;
        let mut grouped: IndexMap<String, ForeignKeyInfo> = IndexMap::new();
        for row in &rows {
            let constraint: String = row.get(0);
            let local_column: String = row.get(1);
            let referred_table: String = row.get(2);
            let referred_column: String = row.get(3);
            let entry = grouped.entry(constraint).or_insert_with(|| ForeignKeyInfo {
                constrained_columns: Vec::new(),
                referred_table,
                referred_columns: Vec::new(),
            });
            entry.constrained_columns.push(local_column);
            entry.referred_columns.push(referred_column);
        }
        Ok(grouped.into_values().collect())
    }

    /// Gather the full reflection for one table.
    pub async fn reflect_table(&self, table: &str) -> Result<TableReflection, DocError> {
        Ok(TableReflection {
            primary_key: self.primary_key(table).await?,
            columns: self.columns(table).await?,
            foreign_keys: self.foreign_keys(table).await?,
        })
    }
}

/// Reduce catalog type spellings to generic identifiers. Spellings with no
/// generic form pass through for the simplifier's lowercase fallback.
fn raw_type_ident(data_type: &str, udt_name: &str, typtype: Option<&str>) -> String {
    match data_type.to_ascii_lowercase().as_str() {
        "character varying" => "varchar".to_string(),
        "character" => "char".to_string(),
        "timestamp without time zone" | "timestamp with time zone" => "timestamp".to_string(),
        "time without time zone" | "time with time zone" => "time".to_string(),
        "double precision" => "float".to_string(),
        "bytea" => "large_binary".to_string(),
        // Enums and other custom types reflect as USER-DEFINED; enums get
        // their own category, the rest keep their catalog name.
        "user-defined" => {
            if typtype == Some("e") {
                "enum".to_string()
            } else {
                udt_name.to_ascii_lowercase()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_spellings_reduce_to_generic_identifiers() {
        assert_eq!(raw_type_ident("character varying", "varchar", None), "varchar");
        assert_eq!(raw_type_ident("timestamp with time zone", "timestamptz", None), "timestamp");
        assert_eq!(raw_type_ident("double precision", "float8", None), "float");
        assert_eq!(raw_type_ident("bytea", "bytea", None), "large_binary");
        assert_eq!(raw_type_ident("ARRAY", "_int4", None), "array");
    }

    #[test]
    fn user_defined_types_use_udt_name_except_enums() {
        assert_eq!(raw_type_ident("USER-DEFINED", "mood", Some("e")), "enum");
        assert_eq!(raw_type_ident("USER-DEFINED", "citext", Some("b")), "citext");
    }

    #[test]
    fn plain_spellings_pass_through() {
        assert_eq!(raw_type_ident("integer", "int4", Some("b")), "integer");
        assert_eq!(raw_type_ident("boolean", "bool", Some("b")), "boolean");
        assert_eq!(raw_type_ident("jsonb", "jsonb", Some("b")), "jsonb");
    }
}
