pub mod memory;
pub mod models;
mod queries;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::Database;

use crate::error::Result;
use crate::status::FileStatus;
use models::{OwnerRef, TrackedFile};

/// Persistence for tracking records, keyed uniquely on `path`.
pub trait FileStore {
    /// Returns the record for `path`, creating it in the `Standing` state if
    /// absent. An existing record keeps its original owner and url.
    fn get_or_create(
        &self,
        owner: Option<&OwnerRef>,
        path: &str,
        url: Option<&str>,
    ) -> Result<TrackedFile>;

    fn get(&self, id: i64) -> Result<Option<TrackedFile>>;

    fn get_by_path(&self, path: &str) -> Result<Option<TrackedFile>>;

    /// Persists the mutable fields (status, viruses found, timestamps).
    fn save(&self, file: &TrackedFile) -> Result<()>;

    /// All records ordered by id, optionally only those in `status`.
    fn list(&self, status: Option<FileStatus>) -> Result<Vec<TrackedFile>>;

    fn list_for_owner(&self, owner: &OwnerRef) -> Result<Vec<TrackedFile>>;

    fn truncate_all(&self) -> Result<()>;
}
