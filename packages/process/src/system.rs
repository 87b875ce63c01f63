//! Process table backed by the running operating system.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use sysinfo::{Pid, ProcessesToUpdate, Signal, System};

use crate::error::ProcessError;
use crate::table::{OpenHandles, ProcessHandle, ProcessTable};

/// The live OS process table.
///
/// Processes, their names and parents come from `sysinfo`. Open handles are
/// read from `/proc/<pid>/fd` on Linux and queried from the Restart Manager
/// on Windows. Other platforms report no open handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl SystemProcessTable {
    /// Create a handle to the system process table.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessTable for SystemProcessTable {
    fn list_open_handles(&self, paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        list_open_handles_impl(&system, paths)
    }

    fn parent_of(&self, pid: u32) -> Option<u32> {
        let system = snapshot_of(pid);
        system
            .process(Pid::from_u32(pid))?
            .parent()
            .map(Pid::as_u32)
            .filter(|&ppid| ppid != 0)
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        let system = snapshot_of(pid);
        let process = system
            .process(Pid::from_u32(pid))
            .ok_or(ProcessError::NoSuchProcess { pid })?;

        match process.kill_with(Signal::Term) {
            Some(true) => Ok(()),
            Some(false) => Err(ProcessError::AccessDenied { pid }),
            // No graceful signal on this platform
            None if process.kill() => Ok(()),
            None => Err(ProcessError::TerminateFailed {
                pid,
                message: "the operating system refused the request".to_string(),
            }),
        }
    }
}

/// A process table snapshot holding only `pid`.
fn snapshot_of(pid: u32) -> System {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
    system
}

/// Name of `pid` in `system`, or the PID itself when it has gone.
#[cfg_attr(not(windows), allow(dead_code))]
fn process_name(system: &System, pid: u32) -> String {
    system
        .process(Pid::from_u32(pid))
        .map_or_else(|| pid.to_string(), |p| p.name().to_string_lossy().into_owned())
}

#[cfg(target_os = "linux")]
fn list_open_handles_impl(system: &System, _paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
    use std::fs;

    if system.processes().is_empty() {
        return Err(ProcessError::TableUnavailable(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no processes are visible",
        )));
    }

    let mut handles = OpenHandles::new();

    for (pid, process) in system.processes() {
        // Threads share their process's descriptors
        if process.thread_kind().is_some() {
            continue;
        }

        // Vanished or inaccessible processes are skipped
        let Ok(fd_entries) = fs::read_dir(format!("/proc/{pid}/fd")) else {
            continue;
        };
        let name = process.name().to_string_lossy().into_owned();

        for fd_entry in fd_entries.flatten() {
            if let Ok(target) = fs::read_link(fd_entry.path())
                && target.is_absolute()
            {
                handles
                    .entry(target)
                    .or_default()
                    .insert(ProcessHandle::new(pid.as_u32(), name.clone()));
            }
        }
    }

    log::debug!("Process table lists {} open paths", handles.len());
    Ok(handles)
}

#[cfg(windows)]
fn list_open_handles_impl(system: &System, paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
    let mut handles = OpenHandles::new();

    for path in paths {
        let holders = match restart_manager::holders_of(path) {
            Ok(holders) => holders,
            Err(e) => {
                log::warn!("Failed to query holders of {}: {e}", path.display());
                continue;
            }
        };

        for (pid, app_name) in holders {
            let name = if system.process(Pid::from_u32(pid)).is_some() {
                process_name(system, pid)
            } else {
                app_name
            };
            handles
                .entry(path.clone())
                .or_default()
                .insert(ProcessHandle::new(pid, name));
        }
    }

    Ok(handles)
}

#[cfg(not(any(target_os = "linux", windows)))]
fn list_open_handles_impl(_system: &System, _paths: &[PathBuf]) -> Result<OpenHandles, ProcessError> {
    static NOTICE: std::sync::Once = std::sync::Once::new();
    NOTICE.call_once(|| {
        log::warn!("Open handles cannot be listed on this platform; lock holders will not be found");
    });
    Ok(OpenHandles::new())
}

#[cfg(windows)]
mod restart_manager {
    use std::io;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows_sys::Win32::Foundation::{ERROR_MORE_DATA, ERROR_SUCCESS};
    use windows_sys::Win32::System::RestartManager::{
        CCH_RM_SESSION_KEY, RM_PROCESS_INFO, RmEndSession, RmGetList, RmRegisterResources,
        RmStartSession,
    };

    /// Re-queries allowed when the holder list grows between calls.
    const MAX_LIST_ATTEMPTS: usize = 4;

    struct Session(u32);

    impl Session {
        fn start() -> io::Result<Self> {
            let mut handle = 0u32;
            let mut key = [0u16; CCH_RM_SESSION_KEY as usize + 1];
            // SAFETY: both out pointers reference live locals of the expected size
            check(unsafe { RmStartSession(&raw mut handle, 0, key.as_mut_ptr()) })?;
            Ok(Self(handle))
        }
    }

    impl Drop for Session {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful RmStartSession
            unsafe { RmEndSession(self.0) };
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn os_error(rc: u32) -> io::Error {
        io::Error::from_raw_os_error(rc as i32)
    }

    fn check(rc: u32) -> io::Result<()> {
        if rc == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(os_error(rc))
        }
    }

    /// Processes with `path` open, as (pid, application name).
    pub(super) fn holders_of(path: &Path) -> io::Result<Vec<(u32, String)>> {
        let session = Session::start()?;

        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let files = [wide.as_ptr()];
        // SAFETY: `files` holds one NUL-terminated string that outlives the call
        check(unsafe {
            RmRegisterResources(
                session.0,
                1,
                files.as_ptr(),
                0,
                std::ptr::null(),
                0,
                std::ptr::null(),
            )
        })?;

        let mut capacity = 0u32;
        for _ in 0..MAX_LIST_ATTEMPTS {
            let mut needed = 0u32;
            let mut count = capacity;
            let mut reasons = 0u32;
            let mut infos: Vec<RM_PROCESS_INFO> = Vec::with_capacity(capacity as usize);

            // SAFETY: `infos` has room for `count` entries
            let rc = unsafe {
                RmGetList(
                    session.0,
                    &raw mut needed,
                    &raw mut count,
                    infos.as_mut_ptr(),
                    &raw mut reasons,
                )
            };
            if rc == ERROR_MORE_DATA {
                capacity = needed;
                continue;
            }
            check(rc)?;

            // SAFETY: RmGetList initialized the first `count` entries
            unsafe { infos.set_len(count as usize) };
            return Ok(infos
                .iter()
                .map(|info| (info.Process.dwProcessId, wide_to_string(&info.strAppName)))
                .collect());
        }

        Err(os_error(ERROR_MORE_DATA))
    }

    fn wide_to_string(raw: &[u16]) -> String {
        let len = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
        String::from_utf16_lossy(&raw[..len])
    }
}
