//! SQL schema for the durable key-value store.
//!
//! The schema is applied as a single batch when a store is opened.

/// Returns the full SQL schema as a single batch string.
///
/// - `kv` - opaque string values keyed by string, written verbatim by callers
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#
}
