use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use super::models::{OwnerRef, TrackedFile};
use super::FileStore;
use crate::error::{Error, Result};
use crate::status::FileStatus;

/// Non-persistent store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: DashMap<String, TrackedFile>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut files: Vec<TrackedFile>) -> Vec<TrackedFile> {
        files.sort_by_key(|f| f.id);
        files
    }
}

impl FileStore for MemoryStore {
    fn get_or_create(
        &self,
        owner: Option<&OwnerRef>,
        path: &str,
        url: Option<&str>,
    ) -> Result<TrackedFile> {
        let entry = self.files.entry(path.to_string()).or_insert_with(|| {
            let mut file = TrackedFile::new(path, owner, url);
            file.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Tracking new file {}", path);
            file
        });
        Ok(entry.value().clone())
    }

    fn get(&self, id: i64) -> Result<Option<TrackedFile>> {
        Ok(self
            .files
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    fn get_by_path(&self, path: &str) -> Result<Option<TrackedFile>> {
        Ok(self.files.get(path).map(|entry| entry.value().clone()))
    }

    fn save(&self, file: &TrackedFile) -> Result<()> {
        let mut stored = self
            .files
            .get_mut(&file.path)
            .filter(|entry| entry.id == file.id)
            .ok_or_else(|| Error::NotFound(format!("id {}", file.id)))?;
        stored.status = file.status;
        stored.viruses_found = file.viruses_found.clone();
        stored.updated_at = file.updated_at.clone();
        stored.scanned_at = file.scanned_at.clone();
        Ok(())
    }

    fn list(&self, status: Option<FileStatus>) -> Result<Vec<TrackedFile>> {
        let files = self
            .files
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.status == s))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(Self::sorted(files))
    }

    fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<TrackedFile>> {
        let files = self
            .files
            .iter()
            .filter(|entry| entry.owner.as_ref() == Some(owner))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(Self::sorted(files))
    }

    fn truncate_all(&self) -> Result<()> {
        self.files.clear();
        Ok(())
    }
}
