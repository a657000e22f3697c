//! SQL schema for the Lookout SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per visitor record. `document` holds every field except the id
-- as camelCase JSON; queries reach into it with json_extract.
CREATE TABLE IF NOT EXISTS records (
    collection  TEXT NOT NULL,
    record_id   TEXT NOT NULL,
    document    TEXT NOT NULL,
    PRIMARY KEY (collection, record_id)
);

CREATE INDEX IF NOT EXISTS records_visitor_idx
    ON records(collection, json_extract(document, '$.visitorId'));

PRAGMA user_version = 1;
";
