//! Simplified documentation types.
//! Collapses dialect-specific type identifiers into a small vocabulary that
//! reads well in documentation, so a record says `string` rather than
//! `VARCHAR(50) COLLATE "SQL_Latin1_General_CP1_CI_AS"`. Matching is
//! case-insensitive; identifiers outside the vocabulary pass through
//! lowercased so unusual types are still documented, just verbatim.

/// Documentation category paired with the raw identifiers it absorbs.
const TYPE_GROUPS: &[(&str, &[&str])] = &[
    // Boolean types
    ("boolean", &["boolean", "bit"]),
    // Number types
    ("float", &["float", "real"]),
    (
        "integer",
        &["big_integer", "bigint", "integer", "small_integer", "smallint", "tinyint"],
    ),
    ("numeric", &["decimal", "numeric"]),
    // String types
    (
        "string",
        &[
            "char",
            "clob",
            "nchar",
            "ntext",
            "nvarchar",
            "string",
            "text",
            "unicode",
            "unicode_text",
            "varchar",
            "uniqueidentifier",
        ],
    ),
    // Temporal types
    ("date", &["date"]),
    ("time", &["time"]),
    ("timestamp", &["datetime", "datetime2", "timestamp"]),
    // Other types
    ("array", &["array"]),
    ("binary", &["binary", "blob", "large_binary", "varbinary"]),
    ("enum", &["enum"]),
    ("json", &["json"]),
];

/// Map a raw dialect type identifier to its documentation category, or to its
/// lowercased self when no category claims it.
pub fn simplify_type(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    for (category, members) in TYPE_GROUPS {
        if members.contains(&lowered.as_str()) {
            return (*category).to_string();
        }
    }
    lowered
}
