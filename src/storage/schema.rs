//! Database schema definitions.
//!
//! Timestamps are stored as INTEGER (Unix milliseconds). Tag and ref lists
//! on ideas are stored as JSON arrays in TEXT columns.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the Hub database.
///
/// Files carry no foreign key to sources: deleting a source removes its
/// files with an explicit statement in the same transaction.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Sources: named origins of content
CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    mode TEXT NOT NULL CHECK (mode IN ('github', 'link', 'local_sync')),
    path TEXT NOT NULL,
    branch TEXT,
    description TEXT,
    synced_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sources_owner ON sources(owner_id);

-- Files: text artifacts keyed by (owner, source, path)
CREATE TABLE IF NOT EXISTS files (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    source_id TEXT NOT NULL,
    path TEXT NOT NULL,
    name TEXT NOT NULL,
    content TEXT,
    size INTEGER NOT NULL DEFAULT 0,
    mime_type TEXT NOT NULL DEFAULT 'text/plain',
    file_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(owner_id, source_id, path)
);

CREATE INDEX IF NOT EXISTS idx_files_source ON files(owner_id, source_id);

-- Ideas: short notes with workflow status
CREATE TABLE IF NOT EXISTS ideas (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'inbox' CHECK (status IN ('inbox', 'active', 'archive')),
    done INTEGER NOT NULL DEFAULT 0,
    tags TEXT NOT NULL DEFAULT '[]',
    refs TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ideas_owner ON ideas(owner_id, created_at);

-- Sync Logs: one audit row per reconciliation run
CREATE TABLE IF NOT EXISTS sync_logs (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    source_id TEXT,
    flow TEXT NOT NULL CHECK (flow IN ('github', 'local_sync', 'ideas')),
    status TEXT NOT NULL CHECK (status IN ('syncing', 'success', 'partial', 'error')),
    files_added INTEGER NOT NULL DEFAULT 0,
    files_updated INTEGER NOT NULL DEFAULT 0,
    files_deleted INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    api_key_id TEXT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_sync_logs_owner ON sync_logs(owner_id, started_at DESC);
CREATE INDEX IF NOT EXISTS idx_sync_logs_source ON sync_logs(source_id, started_at DESC);

-- API Keys: only the SHA256 of the secret is kept
CREATE TABLE IF NOT EXISTS api_keys (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    key_hash TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    last_used_at INTEGER
);
";

/// Apply the schema to a connection.
///
/// Safe to call on every open: every statement is `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if a pragma or statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["sources", "files", "ideas", "sync_logs", "api_keys", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_file_path_unique_per_source() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let insert = "INSERT INTO files (id, owner_id, source_id, path, name, file_hash, created_at, updated_at)
                      VALUES (?1, 'u1', ?2, 'a.txt', 'a.txt', 'h', 0, 0)";
        conn.execute(insert, ["f1", "s1"]).unwrap();
        conn.execute(insert, ["f2", "s2"]).unwrap();
        assert!(conn.execute(insert, ["f3", "s1"]).is_err());
    }

    #[test]
    fn test_mode_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO sources (id, owner_id, name, mode, path, created_at, updated_at)
             VALUES ('s1', 'u1', 'x', 'ftp', 'p', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
