use glob::Pattern;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, LocalFs};
use crate::progress::ProgressReporter;
use crate::resolver::{self, Outcome};
use crate::scanner::{self, VirusScanner};
use crate::status::FileStatus;
use crate::storage::models::{OwnerRef, TrackedFile};
use crate::storage::FileStore;

/// The file field of an owning entity: where the file lives and where it
/// can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub path: String,
    pub url: String,
}

impl AttachedFile {
    pub fn new(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}

/// Client-observable state of the scan owed for one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanJob {
    pub file_id: i64,
    pub path: String,
    pub status: FileStatus,
    pub viruses_found: String,
    pub scanned_at: Option<String>,
    /// True until a scan or existence check settles the status.
    pub pending: bool,
}

impl From<&TrackedFile> for ScanJob {
    fn from(file: &TrackedFile) -> Self {
        Self {
            file_id: file.id,
            path: file.path.clone(),
            status: file.status,
            viruses_found: file.viruses_found.clone(),
            scanned_at: file.scanned_at.clone(),
            pending: file.status.is_pending(),
        }
    }
}

/// Ties a record store to a scanning backend and the configured messages.
pub struct Tracker<S: FileStore> {
    store: S,
    scanner: Box<dyn VirusScanner>,
    fs: Box<dyn FileSystem>,
    config: AppConfig,
}

impl<S: FileStore> Tracker<S> {
    /// Uses the backend selected in `config` and the local filesystem.
    pub fn new(store: S, config: AppConfig) -> Self {
        let scanner = scanner::from_config(&config.scanner);
        Self {
            store,
            scanner,
            fs: Box::new(LocalFs),
            config,
        }
    }

    pub fn with_scanner(mut self, scanner: Box<dyn VirusScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_file_system(mut self, fs: Box<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Looks up or creates the record for `path`. Idempotent on `path`.
    pub fn track(
        &self,
        owner: Option<&OwnerRef>,
        path: &str,
        url: Option<&str>,
    ) -> Result<TrackedFile> {
        self.store.get_or_create(owner, path, url)
    }

    /// Syncs the status with whether the file is on storage and returns
    /// whether it is.
    pub fn check_exists(&self, file: &mut TrackedFile) -> Result<bool> {
        let exists = self.fs.exists(Path::new(&file.path));

        if !exists && file.status != FileStatus::NotExists {
            info!("{} is missing, was '{}'", file.path, file.status);
            file.status = FileStatus::NotExists;
            file.touch();
            self.store.save(file)?;
        } else if exists && file.status == FileStatus::NotExists {
            info!("{} is back on storage", file.path);
            file.status = FileStatus::Standing;
            file.touch();
            self.store.save(file)?;
        }

        Ok(exists)
    }

    /// Scans the file and records the verdict. Returns whether a virus was
    /// found; a missing file is reported as not infected without scanning.
    pub fn scan(&self, file: &mut TrackedFile) -> Result<bool> {
        if !self.check_exists(file)? {
            debug!("Skipping scan of missing file {}", file.path);
            return Ok(false);
        }

        let now = chrono::Utc::now().to_rfc3339();
        match self.scanner.scan_file(Path::new(&file.path)) {
            Ok(verdict) => {
                if verdict.found {
                    warn!("Virus found in {}: {}", file.path, verdict.description);
                    file.status = FileStatus::VirusFound;
                    file.viruses_found = verdict.description;
                } else {
                    info!("{} is clean", file.path);
                    file.status = FileStatus::VirusNotFound;
                    file.viruses_found.clear();
                }
                file.scanned_at = Some(now);
                file.touch();
                self.store.save(file)?;
                Ok(verdict.found)
            }
            Err(err) => {
                warn!("Scan of {} failed: {}", file.path, err);
                file.status = FileStatus::ScanFailed;
                file.viruses_found = err.to_string();
                file.scanned_at = Some(now);
                file.touch();
                if let Err(save_err) = self.store.save(file) {
                    error!(
                        "Could not record failed scan of {} ({}): {}",
                        file.path, err, save_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Resolves what to show for `owner`'s attached file, registering it on
    /// first sight. Does not scan.
    pub fn render(&self, owner: &OwnerRef, field: &AttachedFile) -> Result<Outcome> {
        let file = self.track(Some(owner), &field.path, Some(&field.url))?;
        Ok(resolver::resolve(file.status, file.id, &field.url, &self.config))
    }

    pub fn job_status(&self, file_id: i64) -> Result<ScanJob> {
        let file = self.load(file_id)?;
        Ok(ScanJob::from(&file))
    }

    /// Scans the record `file_id` and returns the refreshed outcome, as the
    /// status-check endpoint answers a waiting client.
    pub fn check(&self, file_id: i64) -> Result<Outcome> {
        let mut file = self.load(file_id)?;
        self.scan(&mut file)?;
        let url = file.url.clone().unwrap_or_default();
        Ok(resolver::resolve(file.status, file.id, &url, &self.config))
    }

    /// Registers every regular file below `dir` for `owner` without scanning.
    /// With `url_prefix`, each record caches `<prefix>/<relative path>`.
    /// Returns the number of files visited.
    pub fn track_dir(
        &self,
        owner: Option<&OwnerRef>,
        dir: &Path,
        url_prefix: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<usize> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.display().to_string()));
        }

        let ignore_patterns: Vec<Pattern> = self
            .config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        // Globs see the path relative to `dir`, never the directories above it.
        let is_ignored = |path: &Path| {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            let name = path.file_name().map(|n| n.to_string_lossy());
            ignore_patterns.iter().any(|pattern| {
                pattern.matches_path(relative)
                    || name.as_deref().map_or(false, |n| pattern.matches(n))
            })
        };

        let start = Instant::now();
        reporter.on_walk_start(&dir.display().to_string());
        let mut tracked = 0usize;

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("Error walking {}: {}", dir.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_string_lossy().into_owned();
            let url = url_prefix.map(|prefix| {
                let relative = entry
                    .path()
                    .strip_prefix(dir)
                    .unwrap_or(entry.path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                format!("{}/{}", prefix.trim_end_matches('/'), relative)
            });

            self.track(owner, &path, url.as_deref())?;
            tracked += 1;
            reporter.on_file_tracked(tracked, &path);
        }

        reporter.on_walk_complete(tracked, start.elapsed().as_secs_f64());
        debug!("Registered {} files under {}", tracked, dir.display());
        Ok(tracked)
    }

    fn load(&self, file_id: i64) -> Result<TrackedFile> {
        self.store
            .get(file_id)?
            .ok_or_else(|| Error::NotFound(format!("id {}", file_id)))
    }
}
