use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spaceshift_config::{KillScope, RelocateConfig};
use spaceshift_inventory::{calculate_size, is_link};
use spaceshift_operations::{
    DiskSpace, Relocator, TransferError, TransferHooks, TransferState, TransferTarget,
    delete_recursive,
};
use spaceshift_process::{
    LockResolver, LockedFileReport, OpenHandles, ProcessError, ProcessHandle, ProcessTable,
};
use tempfile::TempDir;

/// Process table with one process holding one file. Terminating the process
/// removes whatever was blocking the copy of that file.
struct LockingTable {
    handles: RefCell<OpenHandles>,
    blocker: PathBuf,
    terminated: RefCell<Vec<u32>>,
}

impl LockingTable {
    fn new(held: &Path, pid: u32, name: &str, blocker: &Path) -> Self {
        let mut handles = OpenHandles::new();
        handles.insert(
            held.to_path_buf(),
            BTreeSet::from([ProcessHandle::new(pid, name)]),
        );
        Self {
            handles: RefCell::new(handles),
            blocker: blocker.to_path_buf(),
            terminated: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessTable for LockingTable {
    fn list_open_handles(&self, _paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
        Ok(self.handles.borrow().clone())
    }

    fn parent_of(&self, _pid: u32) -> Option<u32> {
        None
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        let held = self
            .handles
            .borrow()
            .values()
            .any(|holders| holders.iter().any(|h| h.pid == pid));
        if !held {
            return Err(ProcessError::NoSuchProcess { pid });
        }

        self.handles.borrow_mut().clear();
        if self.blocker.exists() {
            fs::remove_dir_all(&self.blocker).unwrap();
        }
        self.terminated.borrow_mut().push(pid);
        Ok(())
    }
}

struct FixedSpace(u64);

impl DiskSpace for FixedSpace {
    fn free_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct RecordingHooks {
    kill_reports: RefCell<Vec<LockedFileReport>>,
}

impl TransferHooks for RecordingHooks {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        false
    }

    fn confirm_kill(&self, report: &LockedFileReport) -> bool {
        self.kill_reports.borrow_mut().push(report.clone());
        true
    }

    fn await_manual_delete(&self, _path: &Path, _remaining: &[PathBuf]) -> bool {
        false
    }
}

struct DecliningHooks;

impl TransferHooks for DecliningHooks {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        false
    }

    fn confirm_kill(&self, _report: &LockedFileReport) -> bool {
        false
    }

    fn await_manual_delete(&self, _path: &Path, _remaining: &[PathBuf]) -> bool {
        false
    }
}

fn test_config() -> RelocateConfig {
    RelocateConfig {
        max_retries: 3,
        retry_delay_secs: 0,
        kill_scope: KillScope::Owner,
        ..RelocateConfig::default()
    }
}

fn entries_under(path: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();
    entries
}

#[cfg(unix)]
#[test]
fn test_locked_file_is_recovered_and_folder_linked() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("Editor");
    let destination = dir.path().join("volume");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&destination).unwrap();
    fs::write(source.join("a.txt"), "alpha").unwrap();
    fs::write(source.join("b.txt"), "bravo").unwrap();

    let config = test_config();
    let hooks = RecordingHooks::default();
    let final_path = TransferTarget::plan(&config, &destination, "Editor").final_folder_path;
    let blocker = final_path.join("b.txt");
    let relocator = Relocator::new(
        &config,
        LockingTable::new(&source.join("b.txt"), 4242, "editor", &blocker),
        FixedSpace(u64::MAX),
        &hooks,
    );

    let target = relocator
        .prepare_target(&source, &destination, "Editor", calculate_size(&source))
        .unwrap();
    assert_eq!(target.final_folder_path, final_path);

    // A non-empty directory where b.txt should land makes its copy fail until
    // the holding process is terminated.
    fs::create_dir_all(blocker.join("lock")).unwrap();

    let report = relocator.transfer(&source, &target, |_| {}).unwrap();

    assert_eq!(report.copy.files_total, 2);
    assert_eq!(report.copy.files_copied, 1);
    assert_eq!(report.copy.failed_files.len(), 1);
    assert_eq!(report.copy.failed_files[0].path, source.join("b.txt"));

    let kill_reports = hooks.kill_reports.borrow();
    assert_eq!(kill_reports.len(), 1);
    assert_eq!(kill_reports[0].process_ids(), BTreeSet::from([4242]));
    assert_eq!(*relocator.resolver().table().terminated.borrow(), vec![4242]);

    assert_eq!(report.retried.success_count(), 1);
    assert!(report.retried.still_failed.is_empty());
    assert_eq!(report.state, TransferState::Linked);

    assert_eq!(
        fs::read_to_string(target.final_folder_path.join("a.txt")).unwrap(),
        "alpha"
    );
    assert_eq!(
        fs::read_to_string(target.final_folder_path.join("b.txt")).unwrap(),
        "bravo"
    );
    assert!(is_link(&source));
    assert_eq!(fs::read_link(&source).unwrap(), target.final_folder_path);
    assert_eq!(fs::read_to_string(source.join("b.txt")).unwrap(), "bravo");
}

#[test]
fn test_declined_kill_leaves_source_in_place() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("Editor");
    let destination = dir.path().join("volume");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&destination).unwrap();
    fs::write(source.join("b.txt"), "bravo").unwrap();

    let config = test_config();
    let target = TransferTarget::plan(&config, &destination, "Editor");
    let blocker = target.final_folder_path.join("b.txt");
    fs::create_dir_all(blocker.join("lock")).unwrap();

    let relocator = Relocator::new(
        &config,
        LockingTable::new(&source.join("b.txt"), 4242, "editor", &blocker),
        FixedSpace(u64::MAX),
        &DecliningHooks,
    );
    let report = relocator.transfer(&source, &target, |_| {}).unwrap();

    assert!(!report.is_linked());
    assert!(relocator.resolver().table().terminated.borrow().is_empty());
    assert!(source.is_dir());
    assert!(!is_link(&source));
    assert_eq!(fs::read_to_string(source.join("b.txt")).unwrap(), "bravo");
}

#[test]
fn test_insufficient_space_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("Editor");
    let destination = dir.path().join("volume");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&destination).unwrap();
    fs::write(source.join("a.txt"), "alpha").unwrap();

    let config = test_config();
    let hooks = RecordingHooks::default();
    let relocator = Relocator::new(
        &config,
        LockingTable::new(&source.join("a.txt"), 1, "init", &dir.path().join("none")),
        FixedSpace(4),
        &hooks,
    );

    let err = relocator
        .prepare_target(&source, &destination, "Editor", calculate_size(&source))
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::InsufficientSpace {
            required: 5,
            free: 4,
            ..
        }
    ));
    assert!(entries_under(&destination).is_empty());
    assert_eq!(entries_under(&source), vec![source.join("a.txt")]);
    assert!(hooks.kill_reports.borrow().is_empty());
}

#[test]
fn test_delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree");
    fs::create_dir_all(path.join("nested")).unwrap();
    fs::write(path.join("nested/file.txt"), "x").unwrap();

    let config = test_config();
    let resolver = LockResolver::new(
        LockingTable::new(&dir.path().join("none"), 7, "idle", &dir.path().join("none")),
        config.retry_policy(),
        config.kill_scope,
    );
    let hooks = RecordingHooks::default();

    assert!(delete_recursive(&path, &resolver, &hooks));
    assert!(delete_recursive(&path, &resolver, &hooks));
    assert!(!path.exists());
    assert!(hooks.kill_reports.borrow().is_empty());
}
