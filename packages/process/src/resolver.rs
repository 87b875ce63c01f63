//! Finding, terminating and waiting out processes that hold files open.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use spaceshift_config::{KillScope, RetryPolicy};

use crate::table::{OpenHandles, ProcessHandle, ProcessTable};

/// Upper bound on parent hops when looking for a top-level ancestor.
const MAX_ANCESTOR_DEPTH: usize = 1024;

/// Processes holding one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedFile {
    /// The file path, as given by the caller.
    pub path: PathBuf,
    /// Every process found with an open handle to the file.
    pub holders: BTreeSet<ProcessHandle>,
}

/// Lock holders for a set of files, in the order the files were given.
///
/// Built fresh for each pass; the process IDs are only valid for the process
/// table snapshot it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedFileReport {
    /// One entry per requested file.
    pub files: Vec<LockedFile>,
}

impl LockedFileReport {
    /// Holders of one file, if the file was part of the request.
    #[must_use]
    pub fn holders_of(&self, path: &Path) -> Option<&BTreeSet<ProcessHandle>> {
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(|file| &file.holders)
    }

    /// Every distinct process holding at least one file.
    #[must_use]
    pub fn processes(&self) -> BTreeSet<&ProcessHandle> {
        self.files.iter().flat_map(|file| &file.holders).collect()
    }

    /// Every distinct process ID holding at least one file.
    #[must_use]
    pub fn process_ids(&self) -> BTreeSet<u32> {
        self.files
            .iter()
            .flat_map(|file| file.holders.iter().map(|h| h.pid))
            .collect()
    }

    /// Whether no process holds any of the files.
    #[must_use]
    pub fn is_unheld(&self) -> bool {
        self.files.iter().all(|file| file.holders.is_empty())
    }
}

/// What a lock-resolution pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Holders found for the requested files.
    pub report: LockedFileReport,
    /// Whether termination was approved. `false` when nothing needed it.
    pub approved: bool,
    /// Process IDs that accepted the termination request.
    pub terminated: Vec<u32>,
}

/// Finds and terminates processes holding specific files.
#[derive(Debug, Clone)]
pub struct LockResolver<T: ProcessTable> {
    table: T,
    policy: RetryPolicy,
    scope: KillScope,
}

impl<T: ProcessTable> LockResolver<T> {
    /// Create a resolver over a process table.
    #[must_use]
    pub const fn new(table: T, policy: RetryPolicy, scope: KillScope) -> Self {
        Self {
            table,
            policy,
            scope,
        }
    }

    /// The underlying process table.
    #[must_use]
    pub const fn table(&self) -> &T {
        &self.table
    }

    /// The retry policy this resolver pauses with.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Find every process holding each of `paths` open.
    ///
    /// Every path gets an entry. Paths that do not exist are skipped with a
    /// notice and keep an empty entry; a file nobody holds also gets an empty
    /// entry. If the process table cannot be read at all, every entry is
    /// empty.
    #[must_use]
    pub fn find_locking_processes(&self, paths: &[PathBuf]) -> LockedFileReport {
        log::info!("Looking for processes holding {} files", paths.len());

        let mut report = LockedFileReport {
            files: paths
                .iter()
                .map(|path| LockedFile {
                    path: path.clone(),
                    holders: BTreeSet::new(),
                })
                .collect(),
        };

        let existing: Vec<usize> = paths
            .iter()
            .enumerate()
            .filter_map(|(i, path)| {
                if path.exists() {
                    Some(i)
                } else {
                    log::info!("File does not exist: {}", path.display());
                    None
                }
            })
            .collect();

        if existing.is_empty() {
            return report;
        }

        let queried: Vec<PathBuf> = existing.iter().map(|&i| paths[i].clone()).collect();
        let handles = match self.table.list_open_handles(&queried) {
            Ok(handles) => handles,
            Err(e) => {
                log::warn!("{e}");
                return report;
            }
        };

        for i in existing {
            let file = &mut report.files[i];
            file.holders = holders_for(&handles, &file.path);

            if file.holders.is_empty() {
                log::info!("No process found holding {}", file.path.display());
            } else {
                for holder in &file.holders {
                    log::info!("{} is held by {holder}", file.path.display());
                }
            }
        }

        report
    }

    /// Terminate each distinct process ID once.
    ///
    /// Failures are logged and do not stop the remaining terminations. This
    /// process is never terminated. Returns the IDs that accepted the request.
    pub fn terminate<I>(&self, pids: I) -> Vec<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        let own_pid = std::process::id();
        let unique: BTreeSet<u32> = pids.into_iter().collect();
        let mut terminated = Vec::with_capacity(unique.len());

        for pid in unique {
            if pid == own_pid {
                log::warn!("Refusing to terminate own process (PID: {pid})");
                continue;
            }

            log::info!("Terminating process (PID: {pid})");
            match self.table.terminate(pid) {
                Ok(()) => terminated.push(pid),
                Err(e) => log::warn!("{e}"),
            }
        }

        terminated
    }

    /// Process IDs to terminate for a report, according to the kill scope.
    #[must_use]
    pub fn kill_targets(&self, report: &LockedFileReport) -> BTreeSet<u32> {
        let owners = report.process_ids();
        match self.scope {
            KillScope::Owner => owners,
            KillScope::TreeRoot => {
                let protected = self.own_lineage();
                owners
                    .into_iter()
                    .map(|pid| self.root_of(pid, &protected))
                    .collect()
            }
        }
    }

    /// Find holders of `paths`, terminate them if `confirm` approves, then
    /// pause so the OS can release the handles.
    ///
    /// Only processes holding these specific files (or their top-level
    /// ancestors under [`KillScope::TreeRoot`]) are ever targeted.
    pub fn resolve_and_wait<F>(&self, paths: &[PathBuf], confirm: F) -> ResolveOutcome
    where
        F: FnOnce(&LockedFileReport) -> bool,
    {
        let report = self.find_locking_processes(paths);

        if report.is_unheld() {
            log::info!("No processes to terminate");
            return ResolveOutcome {
                report,
                approved: false,
                terminated: Vec::new(),
            };
        }

        if !confirm(&report) {
            log::info!("Process termination declined");
            return ResolveOutcome {
                report,
                approved: false,
                terminated: Vec::new(),
            };
        }

        let targets = self.kill_targets(&report);
        log::info!(
            "Terminating {} processes (scope: {})",
            targets.len(),
            self.scope
        );
        let terminated = self.terminate(targets);

        log::info!("Waiting for the system to release resources");
        self.policy.pause();

        ResolveOutcome {
            report,
            approved: true,
            terminated,
        }
    }

    /// This process and all of its ancestors.
    fn own_lineage(&self) -> BTreeSet<u32> {
        let mut lineage = BTreeSet::new();
        let mut current = std::process::id();
        lineage.insert(current);

        for _ in 0..MAX_ANCESTOR_DEPTH {
            match self.table.parent_of(current) {
                Some(parent) if lineage.insert(parent) => current = parent,
                _ => break,
            }
        }

        lineage
    }

    /// Highest ancestor of `pid` that is neither init nor part of `protected`.
    fn root_of(&self, pid: u32, protected: &BTreeSet<u32>) -> u32 {
        let mut current = pid;

        for _ in 0..MAX_ANCESTOR_DEPTH {
            match self.table.parent_of(current) {
                Some(parent) if parent > 1 && parent != current && !protected.contains(&parent) => {
                    current = parent;
                }
                _ => break,
            }
        }

        current
    }
}

/// Holders of one path, matching the path as given or in canonical form.
fn holders_for(handles: &OpenHandles, path: &Path) -> BTreeSet<ProcessHandle> {
    if let Some(holders) = handles.get(path) {
        return holders.clone();
    }

    std::fs::canonicalize(path)
        .ok()
        .and_then(|canonical| handles.get(&canonical).cloned())
        .unwrap_or_default()
}
