use std::path::Path;

/// Existence check against the storage holding tracked files.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
}

/// Local disk; only regular files count as present.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
