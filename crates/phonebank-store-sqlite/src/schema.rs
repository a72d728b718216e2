//! SQL schema for the phonebank SQLite store.
//!
//! Executed at connection startup. Every partition table is created from the
//! same template; table names come from validated [`PartitionId`]s only.

use phonebank_core::PartitionId;

/// Connection-level settings applied before any table is touched.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// DDL for one partition; idempotent thanks to `IF NOT EXISTS`.
pub fn partition_ddl(partition: PartitionId) -> String {
  let table = partition.table_name();
  format!(
    "
CREATE TABLE IF NOT EXISTS {table} (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
    phone_number  TEXT    NOT NULL,                   -- 0 + nine digits
    dataset_name  TEXT    NOT NULL,
    receive_date  TEXT    NOT NULL,                   -- YYYY-MM-DD
    source        TEXT    NOT NULL DEFAULT '',
    detail        TEXT    NOT NULL DEFAULT '',
    data_type     TEXT    NOT NULL,                   -- 'organization' | 'external'
    is_exported   INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL                    -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS {table}_phone_idx   ON {table}(phone_number);
CREATE INDEX IF NOT EXISTS {table}_dataset_idx ON {table}(dataset_name);
"
  )
}

/// Full schema for every partition.
pub fn schema() -> String {
  let mut sql = String::from(PRAGMAS);
  for partition in PartitionId::all() {
    sql.push_str(&partition_ddl(partition));
  }
  sql.push_str("\nPRAGMA user_version = 1;\n");
  sql
}
