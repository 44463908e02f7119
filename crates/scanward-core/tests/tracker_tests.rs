use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use scanward_core::config::BackendKind;
use scanward_core::storage::{Database, FileStore, MemoryStore};
use scanward_core::{
    AppConfig, AttachedFile, Error, FileStatus, Outcome, OwnerRef, ScanVerdict, SilentReporter,
    Tracker, VirusScanner,
};
use tempfile::{tempdir, TempDir};

/// Scanner double that answers with a fixed result and records every call.
struct FakeScanner {
    answer: Result<ScanVerdict, String>,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl FakeScanner {
    fn new(answer: Result<ScanVerdict, String>) -> (Self, Rc<RefCell<Vec<PathBuf>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                answer,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl VirusScanner for FakeScanner {
    fn name(&self) -> &str {
        "fake"
    }

    fn scan_file(&self, path: &Path) -> scanward_core::Result<ScanVerdict> {
        self.calls.borrow_mut().push(path.to_path_buf());
        self.answer.clone().map_err(|message| Error::Scanner {
            backend: "fake".to_string(),
            path: path.display().to_string(),
            message,
        })
    }
}

fn tracker_with(
    answer: Result<ScanVerdict, String>,
) -> (Tracker<Database>, Rc<RefCell<Vec<PathBuf>>>) {
    let (scanner, calls) = FakeScanner::new(answer);
    let tracker = Tracker::new(Database::open_in_memory().unwrap(), AppConfig::default())
        .with_scanner(Box::new(scanner));
    (tracker, calls)
}

fn upload(dir: &TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, b"uploaded bytes").unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_track_twice_returns_same_record() {
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));
    let owner = OwnerRef::new("attachment", 1);

    let first = tracker.track(Some(&owner), "/srv/a.pdf", Some("http://x/a.pdf")).unwrap();
    let second = tracker.track(None, "/srv/a.pdf", None).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.path, "/srv/a.pdf");
    assert_eq!(second.owner, Some(owner));
}

#[test]
fn test_check_exists_marks_missing_file_from_any_status() {
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));

    for (i, prior) in FileStatus::ALL.into_iter().enumerate() {
        let path = format!("/definitely/missing/{}", i);
        let mut file = tracker.track(None, &path, None).unwrap();
        file.status = prior;
        tracker.store().save(&file).unwrap();

        assert!(!tracker.check_exists(&mut file).unwrap());
        assert_eq!(file.status, FileStatus::NotExists);
        let stored = tracker.store().get(file.id).unwrap().unwrap();
        assert_eq!(stored.status, FileStatus::NotExists);
    }
}

#[test]
fn test_check_exists_restores_standing_when_file_returns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("late.txt");
    let path_str = path.to_str().unwrap();
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));

    let mut file = tracker.track(None, path_str, None).unwrap();
    assert!(!tracker.check_exists(&mut file).unwrap());
    assert_eq!(file.status, FileStatus::NotExists);

    fs::write(&path, b"arrived").unwrap();
    assert!(tracker.check_exists(&mut file).unwrap());
    assert_eq!(file.status, FileStatus::Standing);
    assert_eq!(
        tracker.store().get(file.id).unwrap().unwrap().status,
        FileStatus::Standing
    );
}

#[test]
fn test_check_exists_leaves_settled_status_alone() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "clean.txt");
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));

    let mut file = tracker.track(None, &path, None).unwrap();
    file.status = FileStatus::VirusFound;
    tracker.store().save(&file).unwrap();

    assert!(tracker.check_exists(&mut file).unwrap());
    assert_eq!(file.status, FileStatus::VirusFound);
}

#[test]
fn test_scan_missing_file_never_calls_scanner() {
    let (tracker, calls) = tracker_with(Ok(ScanVerdict::infected("EICAR")));
    let mut file = tracker.track(None, "/definitely/missing.bin", None).unwrap();

    assert!(!tracker.scan(&mut file).unwrap());
    assert!(calls.borrow().is_empty());
    assert_eq!(file.status, FileStatus::NotExists);
}

#[test]
fn test_scan_records_virus() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "eicar.com");
    let (tracker, calls) = tracker_with(Ok(ScanVerdict::infected("EICAR")));

    let mut file = tracker.track(None, &path, None).unwrap();
    assert!(tracker.scan(&mut file).unwrap());

    assert_eq!(calls.borrow().as_slice(), &[PathBuf::from(&path)]);
    let stored = tracker.store().get(file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::VirusFound);
    assert_eq!(stored.viruses_found, "EICAR");
    assert!(stored.scanned_at.is_some());
}

#[test]
fn test_scan_clean_clears_previous_findings() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "fixed.doc");
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));

    let mut file = tracker.track(None, &path, None).unwrap();
    file.status = FileStatus::VirusFound;
    file.viruses_found = "Old.Signature".to_string();
    tracker.store().save(&file).unwrap();

    assert!(!tracker.scan(&mut file).unwrap());
    let stored = tracker.store().get(file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::VirusNotFound);
    assert_eq!(stored.viruses_found, "");
}

#[test]
fn test_scanner_failure_is_recorded_and_propagated() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "big.iso");
    let (tracker, _) = tracker_with(Err("clamd unreachable".to_string()));

    let mut file = tracker.track(None, &path, None).unwrap();
    let result = tracker.scan(&mut file);
    assert!(matches!(result, Err(Error::Scanner { .. })));

    let stored = tracker.store().get(file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::ScanFailed);
    assert!(stored.viruses_found.contains("clamd unreachable"));
}

#[test]
fn test_render_registers_and_resolves_without_scanning() {
    let (tracker, calls) = tracker_with(Ok(ScanVerdict::clean()));
    let owner = OwnerRef::new("document", 3);
    let field = AttachedFile::new("/srv/doc.pdf", "http://x/y");

    let outcome = tracker.render(&owner, &field).unwrap();
    let file = tracker.store().get_by_path("/srv/doc.pdf").unwrap().unwrap();

    assert!(calls.borrow().is_empty());
    assert_eq!(file.owner, Some(owner));
    match outcome {
        Outcome::Waiting {
            file_id, check_url, ..
        } => {
            assert_eq!(file_id, file.id);
            assert_eq!(check_url, format!("/antivirus/files/{}/check/", file.id));
        }
        other => panic!("expected waiting outcome, got {:?}", other),
    }
}

#[test]
fn test_render_after_clean_scan_links_field_url() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "clean.pdf");
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));
    let owner = OwnerRef::new("document", 3);
    let field = AttachedFile::new(path.clone(), "http://x/y");

    let mut file = tracker.track(Some(&owner), &path, Some("http://x/y")).unwrap();
    tracker.scan(&mut file).unwrap();

    let outcome = tracker.render(&owner, &field).unwrap();
    assert!(outcome.allows_download());
    assert!(outcome.to_html().contains("http://x/y"));
}

#[test]
fn test_check_scans_and_returns_refreshed_outcome() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "bad.exe");
    let (tracker, _) = tracker_with(Ok(ScanVerdict::infected("EICAR")));

    let file = tracker.track(None, &path, Some("http://x/bad.exe")).unwrap();
    let before = tracker.job_status(file.id).unwrap();
    assert!(before.pending);
    assert_eq!(before.status, FileStatus::Standing);

    let outcome = tracker.check(file.id).unwrap();
    assert!(matches!(outcome, Outcome::VirusFound { .. }));
    assert!(!outcome.to_html().contains("http://x/bad.exe"));

    let after = tracker.job_status(file.id).unwrap();
    assert!(!after.pending);
    assert_eq!(after.status, FileStatus::VirusFound);
    assert_eq!(after.viruses_found, "EICAR");
}

#[test]
fn test_check_unknown_id() {
    let (tracker, _) = tracker_with(Ok(ScanVerdict::clean()));
    assert!(matches!(tracker.check(999), Err(Error::NotFound(_))));
    assert!(matches!(tracker.job_status(999), Err(Error::NotFound(_))));
}

#[test]
fn test_track_dir_honours_ignore_patterns() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::create_dir_all(dir.path().join("cache")).unwrap();
    fs::write(dir.path().join("docs/a.pdf"), b"a").unwrap();
    fs::write(dir.path().join("docs/b.tmp"), b"b").unwrap();
    fs::write(dir.path().join("cache/c.pdf"), b"c").unwrap();
    fs::write(dir.path().join("top.txt"), b"t").unwrap();

    let mut config = AppConfig::default();
    config.scanner.backend = BackendKind::None;
    config.ignore_patterns = vec!["*.tmp".to_string(), "cache".to_string()];
    let tracker = Tracker::new(MemoryStore::new(), config);
    let owner = OwnerRef::new("share", 5);

    let count = tracker
        .track_dir(Some(&owner), dir.path(), Some("http://files/"), &SilentReporter)
        .unwrap();
    assert_eq!(count, 2);

    let files = tracker.store().list_for_owner(&owner).unwrap();
    let mut urls: Vec<_> = files.iter().filter_map(|f| f.url.clone()).collect();
    urls.sort();
    assert_eq!(urls, vec!["http://files/docs/a.pdf", "http://files/top.txt"]);
    assert!(files.iter().all(|f| f.status == FileStatus::Standing));

    let again = tracker
        .track_dir(Some(&owner), dir.path(), None, &SilentReporter)
        .unwrap();
    assert_eq!(again, 2);
    assert_eq!(tracker.store().list(None).unwrap().len(), 2);
}

#[test]
fn test_track_dir_rejects_missing_directory() {
    let tracker = Tracker::new(MemoryStore::new(), AppConfig::default());
    let result = tracker.track_dir(None, Path::new("/no/such/dir"), None, &SilentReporter);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_signature_backend_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eicar.txt");
    fs::write(&path, scanward_core::scanner::EICAR_SIGNATURE).unwrap();

    let mut config = AppConfig::default();
    config.scanner.backend = BackendKind::Signature;
    let tracker = Tracker::new(MemoryStore::new(), config);

    let file = tracker.track(None, path.to_str().unwrap(), None).unwrap();
    let outcome = tracker.check(file.id).unwrap();
    assert!(matches!(outcome, Outcome::VirusFound { .. }));
    assert_eq!(
        tracker.job_status(file.id).unwrap().viruses_found,
        "Eicar-Test-Signature"
    );
}

#[test]
fn test_rescan_moves_record_out_of_scan_failed() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "flaky.zip");
    let (tracker, _) = tracker_with(Err("clamd unreachable".to_string()));

    let mut file = tracker.track(None, &path, None).unwrap();
    assert!(tracker.scan(&mut file).is_err());
    assert_eq!(file.status, FileStatus::ScanFailed);

    let (recovered, _) = FakeScanner::new(Ok(ScanVerdict::infected("Win.Worm.Flaky")));
    let tracker = tracker.with_scanner(Box::new(recovered));
    assert!(tracker.scan(&mut file).unwrap());

    let stored = tracker.store().get(file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::VirusFound);
    assert_eq!(stored.viruses_found, "Win.Worm.Flaky");

    let (clean, _) = FakeScanner::new(Ok(ScanVerdict::clean()));
    let tracker = tracker.with_scanner(Box::new(clean));
    let mut file = stored;
    assert!(!tracker.scan(&mut file).unwrap());
    let stored = tracker.store().get(file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::VirusNotFound);
    assert_eq!(stored.viruses_found, "");
}

#[test]
fn test_scanner_error_survives_failed_save() {
    let dir = tempdir().unwrap();
    let path = upload(&dir, "unsaved.bin");
    let (scanner, _) = FakeScanner::new(Err("engine crashed".to_string()));
    let tracker = Tracker::new(MemoryStore::new(), AppConfig::default())
        .with_scanner(Box::new(scanner));

    // Never stored, so persisting the failed status cannot succeed.
    let mut file = scanward_core::TrackedFile::new(&path, None, None);
    match tracker.scan(&mut file) {
        Err(Error::Scanner { message, .. }) => assert_eq!(message, "engine crashed"),
        other => panic!("expected scanner error, got {:?}", other),
    }
    assert_eq!(file.status, FileStatus::ScanFailed);
}

#[test]
fn test_track_dir_ignores_only_inside_the_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("build").join("uploads");
    fs::create_dir_all(root.join("build")).unwrap();
    fs::write(root.join("report.pdf"), b"r").unwrap();
    fs::write(root.join("build/artifact.o"), b"o").unwrap();

    let mut config = AppConfig::default();
    config.scanner.backend = BackendKind::None;
    config.ignore_patterns = vec!["build/*".to_string()];
    let tracker = Tracker::new(MemoryStore::new(), config);

    let count = tracker
        .track_dir(None, &root, None, &SilentReporter)
        .unwrap();
    assert_eq!(count, 1);
    let files = tracker.store().list(None).unwrap();
    assert!(files[0].path.ends_with("report.pdf"));

    let mut config = AppConfig::default();
    config.scanner.backend = BackendKind::None;
    config.ignore_patterns = vec!["*/build/*".to_string()];
    let tracker = Tracker::new(MemoryStore::new(), config);
    let count = tracker
        .track_dir(None, &root, None, &SilentReporter)
        .unwrap();
    assert_eq!(count, 2);
}
