//! Store wrapper that fails chosen items, for per-item isolation tests.

use crate::model::sync_log::SyncLogUpdate;
use crate::model::{
    ApiKey, FilePatch, FileRecord, Idea, IdeaDraft, IdeaPatch, LocalFile, Source, SyncLog,
};
use crate::storage::{SqliteStorage, Store, StoreError, StoreResult};

pub struct FlakyStore {
    inner: SqliteStorage,
    fail_paths: Vec<String>,
    fail_ideas: Vec<String>,
    fail_list: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStorage::open_memory().unwrap(),
            fail_paths: Vec::new(),
            fail_ideas: Vec::new(),
            fail_list: false,
        }
    }

    /// Fail every write touching this file path.
    pub fn fail_path(mut self, path: &str) -> Self {
        self.fail_paths.push(path.to_string());
        self
    }

    /// Fail inserts of ideas with this exact content.
    pub fn fail_idea(mut self, content: &str) -> Self {
        self.fail_ideas.push(content.to_string());
        self
    }

    /// Fail reads of the stored file and idea snapshots.
    pub fn fail_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    fn check_list(&self) -> StoreResult<()> {
        if self.fail_list {
            return Err(StoreError::Network("injected failure".to_string()));
        }
        Ok(())
    }

    fn check_path(&self, path: &str) -> StoreResult<()> {
        if self.fail_paths.iter().any(|p| p == path) {
            return Err(StoreError::Unknown("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Store for FlakyStore {
    fn list_sources(&self, owner_id: &str) -> StoreResult<Vec<Source>> {
        self.inner.list_sources(owner_id)
    }

    fn get_source(&self, owner_id: &str, id: &str) -> StoreResult<Option<Source>> {
        self.inner.get_source(owner_id, id)
    }

    fn insert_source(&self, source: &Source) -> StoreResult<()> {
        self.inner.insert_source(source)
    }

    fn touch_source_synced(&self, owner_id: &str, id: &str, at: i64) -> StoreResult<()> {
        self.inner.touch_source_synced(owner_id, id, at)
    }

    fn delete_source(&self, owner_id: &str, id: &str) -> StoreResult<usize> {
        self.inner.delete_source(owner_id, id)
    }

    fn list_files(&self, owner_id: &str, source_id: &str) -> StoreResult<Vec<FileRecord>> {
        self.check_list()?;
        self.inner.list_files(owner_id, source_id)
    }

    fn upsert_file(
        &self,
        owner_id: &str,
        source_id: &str,
        file: &LocalFile,
    ) -> StoreResult<FileRecord> {
        self.check_path(&file.path)?;
        self.inner.upsert_file(owner_id, source_id, file)
    }

    fn update_file(&self, owner_id: &str, id: &str, patch: &FilePatch) -> StoreResult<FileRecord> {
        self.inner.update_file(owner_id, id, patch)
    }

    fn delete_file_by_path(
        &self,
        owner_id: &str,
        source_id: &str,
        path: &str,
    ) -> StoreResult<usize> {
        self.check_path(path)?;
        self.inner.delete_file_by_path(owner_id, source_id, path)
    }

    fn delete_files(&self, owner_id: &str, ids: &[String]) -> StoreResult<usize> {
        self.inner.delete_files(owner_id, ids)
    }

    fn delete_files_for_source(&self, owner_id: &str, source_id: &str) -> StoreResult<usize> {
        self.inner.delete_files_for_source(owner_id, source_id)
    }

    fn list_ideas(&self, owner_id: &str) -> StoreResult<Vec<Idea>> {
        self.check_list()?;
        self.inner.list_ideas(owner_id)
    }

    fn insert_idea(&self, owner_id: &str, draft: &IdeaDraft) -> StoreResult<Idea> {
        if self.fail_ideas.iter().any(|c| *c == draft.content) {
            return Err(StoreError::Unknown("injected failure".to_string()));
        }
        self.inner.insert_idea(owner_id, draft)
    }

    fn update_idea(&self, owner_id: &str, id: &str, patch: &IdeaPatch) -> StoreResult<Idea> {
        self.inner.update_idea(owner_id, id, patch)
    }

    fn delete_idea(&self, owner_id: &str, id: &str) -> StoreResult<usize> {
        self.inner.delete_idea(owner_id, id)
    }

    fn start_sync_log(&self, log: &SyncLog) -> StoreResult<()> {
        self.inner.start_sync_log(log)
    }

    fn finish_sync_log(&self, id: &str, update: &SyncLogUpdate) -> StoreResult<()> {
        self.inner.finish_sync_log(id, update)
    }

    fn list_sync_logs(
        &self,
        owner_id: &str,
        source_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SyncLog>> {
        self.inner.list_sync_logs(owner_id, source_id, limit)
    }

    fn insert_api_key(&self, key: &ApiKey) -> StoreResult<()> {
        self.inner.insert_api_key(key)
    }

    fn find_api_key(&self, key_hash: &str) -> StoreResult<Option<ApiKey>> {
        self.inner.find_api_key(key_hash)
    }

    fn touch_api_key(&self, id: &str, at: i64) -> StoreResult<()> {
        self.inner.touch_api_key(id, at)
    }
}
