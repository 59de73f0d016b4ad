//! SQLite storage implementation.
//!
//! A single connection guarded by a mutex. Every statement filters on
//! `owner_id`, so one database can serve several owners.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use super::schema::apply_schema;
use super::{Store, StoreError, StoreResult};
use crate::model::sync_log::SyncLogUpdate;
use crate::model::{
    new_id, now_millis, ApiKey, FilePatch, FileRecord, Idea, IdeaDraft, IdeaPatch, LocalFile,
    Source, SyncLog,
};

const SOURCE_COLUMNS: &str =
    "id, owner_id, name, mode, path, branch, description, synced_at, created_at, updated_at";

const FILE_COLUMNS: &str = "id, owner_id, source_id, path, name, content, size, mime_type, file_hash, created_at, updated_at";

const IDEA_COLUMNS: &str = "id, owner_id, content, status, done, tags, refs, created_at, updated_at";

const SYNC_LOG_COLUMNS: &str = "id, owner_id, source_id, flow, status, files_added, files_updated, files_deleted, error_message, api_key_id, started_at, completed_at";

const API_KEY_COLUMNS: &str = "id, owner_id, name, key_hash, created_at, last_used_at";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Network(format!("{}: {e}", path.display())))?;

        // Default 5 second timeout
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5000)))?;

        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unknown("connection mutex poisoned".to_string()))
    }
}

// ==================
// Row mapping
// ==================

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_source(row: &Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        mode: parse_column(row, 3)?,
        path: row.get(4)?,
        branch: row.get(5)?,
        description: row.get(6)?,
        synced_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_file(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        source_id: row.get(2)?,
        path: row.get(3)?,
        name: row.get(4)?,
        content: row.get(5)?,
        size: row.get(6)?,
        mime_type: row.get(7)?,
        file_hash: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_idea(row: &Row<'_>) -> rusqlite::Result<Idea> {
    Ok(Idea {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        content: row.get(2)?,
        status: parse_column(row, 3)?,
        done: row.get(4)?,
        tags: json_list(row, 5)?,
        refs: json_list(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn map_sync_log(row: &Row<'_>) -> rusqlite::Result<SyncLog> {
    Ok(SyncLog {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        source_id: row.get(2)?,
        flow: parse_column(row, 3)?,
        status: parse_column(row, 4)?,
        files_added: row.get(5)?,
        files_updated: row.get(6)?,
        files_deleted: row.get(7)?,
        error_message: row.get(8)?,
        api_key_id: row.get(9)?,
        started_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}

fn map_api_key(row: &Row<'_>) -> rusqlite::Result<ApiKey> {
    Ok(ApiKey {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        key_hash: row.get(3)?,
        created_at: row.get(4)?,
        last_used_at: row.get(5)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Store for SqliteStorage {
    // ==================
    // Source Operations
    // ==================

    fn list_sources(&self, owner_id: &str) -> StoreResult<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE owner_id = ?1 ORDER BY created_at, id"
        ))?;
        let rows = stmt
            .query_map([owner_id], map_source)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_source(&self, owner_id: &str, id: &str) -> StoreResult<Option<Source>> {
        let conn = self.conn()?;
        let source = conn
            .query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE owner_id = ?1 AND id = ?2"),
                [owner_id, id],
                map_source,
            )
            .optional()?;
        Ok(source)
    }

    fn insert_source(&self, source: &Source) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO sources ({SOURCE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            rusqlite::params![
                source.id,
                source.owner_id,
                source.name,
                source.mode.as_str(),
                source.path,
                source.branch,
                source.description,
                source.synced_at,
                source.created_at,
                source.updated_at,
            ],
        )?;
        Ok(())
    }

    fn touch_source_synced(&self, owner_id: &str, id: &str, at: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE sources SET synced_at = ?3, updated_at = ?3 WHERE owner_id = ?1 AND id = ?2",
            rusqlite::params![owner_id, id, at],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("source {id}")));
        }
        Ok(())
    }

    fn delete_source(&self, owner_id: &str, id: &str) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let rows = tx.execute(
            "DELETE FROM sources WHERE owner_id = ?1 AND id = ?2",
            [owner_id, id],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("source {id}")));
        }

        let files = tx.execute(
            "DELETE FROM files WHERE owner_id = ?1 AND source_id = ?2",
            [owner_id, id],
        )?;

        tx.commit()?;
        Ok(files)
    }

    // ==================
    // File Operations
    // ==================

    fn list_files(&self, owner_id: &str, source_id: &str) -> StoreResult<Vec<FileRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 AND source_id = ?2 ORDER BY path"
        ))?;
        let rows = stmt
            .query_map([owner_id, source_id], map_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn upsert_file(
        &self,
        owner_id: &str,
        source_id: &str,
        file: &LocalFile,
    ) -> StoreResult<FileRecord> {
        let now = now_millis();
        let conn = self.conn()?;
        let record = conn.query_row(
            &format!(
                "INSERT INTO files ({FILE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
                 ON CONFLICT(owner_id, source_id, path) DO UPDATE SET
                    name = excluded.name,
                    content = excluded.content,
                    size = excluded.size,
                    mime_type = excluded.mime_type,
                    file_hash = excluded.file_hash,
                    updated_at = excluded.updated_at
                 RETURNING {FILE_COLUMNS}"
            ),
            rusqlite::params![
                new_id("file"),
                owner_id,
                source_id,
                file.path,
                file.name,
                file.content,
                file.size,
                file.mime_type,
                file.file_hash,
                now,
            ],
            map_file,
        )?;
        Ok(record)
    }

    fn update_file(&self, owner_id: &str, id: &str, patch: &FilePatch) -> StoreResult<FileRecord> {
        // Build dynamic UPDATE query based on provided fields
        let mut set_clauses = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now_millis())];

        if let Some(name) = &patch.name {
            set_clauses.push("name = ?");
            params.push(Box::new(name.clone()));
        }
        if let Some(content) = &patch.content {
            set_clauses.push("content = ?");
            params.push(Box::new(content.clone()));
        }
        if let Some(size) = patch.size {
            set_clauses.push("size = ?");
            params.push(Box::new(size));
        }
        if let Some(mime_type) = &patch.mime_type {
            set_clauses.push("mime_type = ?");
            params.push(Box::new(mime_type.clone()));
        }
        if let Some(file_hash) = &patch.file_hash {
            set_clauses.push("file_hash = ?");
            params.push(Box::new(file_hash.clone()));
        }

        params.push(Box::new(owner_id.to_string()));
        params.push(Box::new(id.to_string()));

        let sql = format!(
            "UPDATE files SET {} WHERE owner_id = ? AND id = ? RETURNING {FILE_COLUMNS}",
            set_clauses.join(", ")
        );
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();

        let conn = self.conn()?;
        conn.query_row(&sql, param_refs.as_slice(), map_file)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("file {id}")))
    }

    fn delete_file_by_path(
        &self,
        owner_id: &str,
        source_id: &str,
        path: &str,
    ) -> StoreResult<usize> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM files WHERE owner_id = ?1 AND source_id = ?2 AND path = ?3",
            [owner_id, source_id, path],
        )?;
        Ok(rows)
    }

    fn delete_files(&self, owner_id: &str, ids: &[String]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM files WHERE owner_id = ? AND id IN ({})",
            placeholders(ids.len())
        );
        let conn = self.conn()?;
        let rows = conn.execute(
            &sql,
            rusqlite::params_from_iter(
                std::iter::once(owner_id).chain(ids.iter().map(String::as_str)),
            ),
        )?;
        Ok(rows)
    }

    fn delete_files_for_source(&self, owner_id: &str, source_id: &str) -> StoreResult<usize> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM files WHERE owner_id = ?1 AND source_id = ?2",
            [owner_id, source_id],
        )?;
        Ok(rows)
    }

    // ==================
    // Idea Operations
    // ==================

    fn list_ideas(&self, owner_id: &str) -> StoreResult<Vec<Idea>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE owner_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
            .query_map([owner_id], map_idea)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_idea(&self, owner_id: &str, draft: &IdeaDraft) -> StoreResult<Idea> {
        let now = now_millis();
        let idea = Idea {
            id: new_id("idea"),
            owner_id: owner_id.to_string(),
            content: draft.content.clone(),
            status: draft.status,
            done: draft.done,
            tags: draft.tags.clone(),
            refs: draft.refs.clone(),
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO ideas ({IDEA_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            rusqlite::params![
                idea.id,
                idea.owner_id,
                idea.content,
                idea.status.as_str(),
                idea.done,
                serde_json::to_string(&idea.tags)?,
                serde_json::to_string(&idea.refs)?,
                idea.created_at,
                idea.updated_at,
            ],
        )?;
        Ok(idea)
    }

    fn update_idea(&self, owner_id: &str, id: &str, patch: &IdeaPatch) -> StoreResult<Idea> {
        let mut set_clauses = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now_millis())];

        if let Some(status) = patch.status {
            set_clauses.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(done) = patch.done {
            set_clauses.push("done = ?");
            params.push(Box::new(done));
        }
        if let Some(tags) = &patch.tags {
            set_clauses.push("tags = ?");
            params.push(Box::new(serde_json::to_string(tags)?));
        }
        if let Some(refs) = &patch.refs {
            set_clauses.push("refs = ?");
            params.push(Box::new(serde_json::to_string(refs)?));
        }

        params.push(Box::new(owner_id.to_string()));
        params.push(Box::new(id.to_string()));

        let sql = format!(
            "UPDATE ideas SET {} WHERE owner_id = ? AND id = ? RETURNING {IDEA_COLUMNS}",
            set_clauses.join(", ")
        );
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();

        let conn = self.conn()?;
        conn.query_row(&sql, param_refs.as_slice(), map_idea)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("idea {id}")))
    }

    fn delete_idea(&self, owner_id: &str, id: &str) -> StoreResult<usize> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM ideas WHERE owner_id = ?1 AND id = ?2",
            [owner_id, id],
        )?;
        Ok(rows)
    }

    // ==================
    // Sync Log Operations
    // ==================

    fn start_sync_log(&self, log: &SyncLog) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO sync_logs ({SYNC_LOG_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params![
                log.id,
                log.owner_id,
                log.source_id,
                log.flow.as_str(),
                log.status.as_str(),
                log.files_added,
                log.files_updated,
                log.files_deleted,
                log.error_message,
                log.api_key_id,
                log.started_at,
                log.completed_at,
            ],
        )?;
        Ok(())
    }

    fn finish_sync_log(&self, id: &str, update: &SyncLogUpdate) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE sync_logs SET status = ?2, files_added = ?3, files_updated = ?4,
                files_deleted = ?5, error_message = ?6, completed_at = ?7
             WHERE id = ?1 AND status = 'syncing'",
            rusqlite::params![
                id,
                update.status.as_str(),
                update.files_added,
                update.files_updated,
                update.files_deleted,
                update.error_message,
                update.completed_at,
            ],
        )?;

        if rows == 0 {
            let exists = conn
                .query_row("SELECT 1 FROM sync_logs WHERE id = ?1", [id], |_| Ok(()))
                .optional()?
                .is_some();
            return Err(if exists {
                StoreError::Conflict(format!("sync log {id} already finalized"))
            } else {
                StoreError::NotFound(format!("sync log {id}"))
            });
        }
        Ok(())
    }

    fn list_sync_logs(
        &self,
        owner_id: &str,
        source_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SyncLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs
             WHERE owner_id = ?1 AND (?2 IS NULL OR source_id = ?2)
             ORDER BY started_at DESC, rowid DESC
             LIMIT ?3"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(rusqlite::params![owner_id, source_id, limit], map_sync_log)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==================
    // API Key Operations
    // ==================

    fn insert_api_key(&self, key: &ApiKey) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO api_keys ({API_KEY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            rusqlite::params![
                key.id,
                key.owner_id,
                key.name,
                key.key_hash,
                key.created_at,
                key.last_used_at,
            ],
        )?;
        Ok(())
    }

    fn find_api_key(&self, key_hash: &str) -> StoreResult<Option<ApiKey>> {
        let conn = self.conn()?;
        let key = conn
            .query_row(
                &format!("SELECT {API_KEY_COLUMNS} FROM api_keys WHERE key_hash = ?1"),
                [key_hash],
                map_api_key,
            )
            .optional()?;
        Ok(key)
    }

    fn touch_api_key(&self, id: &str, at: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE api_keys SET last_used_at = ?2 WHERE id = ?1",
            rusqlite::params![id, at],
        )?;
        Ok(())
    }
}
