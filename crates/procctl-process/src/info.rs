//! Process introspection snapshots.
//!
//! A [`ProcessInfo`] is captured once and never refreshed. Only the initial
//! existence check can fail; a field the OS refuses to show (permissions,
//! kernel threads, a process that exits mid-capture) is left empty.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use procctl_common::{Error, ProcId, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::check::{cwd_from_proc_id, exe_from_proc_id, parent_proc_id_from_proc_id, proc_id_exists};
use crate::platform::{Introspect, Native};

#[cfg(feature = "gui-window")]
use procctl_common::WindowId;

bitflags! {
    /// Which fields a snapshot captures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InfoFlags: u32 {
        const EXECUTABLE_PATH = 1;
        const WORKING_DIRECTORY = 1 << 1;
        const PARENT_PROC_ID = 1 << 2;
        const CHILD_PROC_IDS = 1 << 3;
        const COMMAND_LINE = 1 << 4;
        const ENVIRONMENT = 1 << 5;
        #[cfg(feature = "gui-window")]
        const OWNED_WINDOWS = 1 << 6;
    }
}

impl Default for InfoFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Immutable snapshot of one process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pid: ProcId,
    flags: InfoFlags,
    executable_path: Option<PathBuf>,
    working_directory: Option<PathBuf>,
    parent: Option<ProcId>,
    children: Vec<ProcId>,
    command_line: Vec<String>,
    environment: Vec<String>,
    #[cfg(feature = "gui-window")]
    owned_windows: Vec<WindowId>,
    captured_at: DateTime<Utc>,
}

impl ProcessInfo {
    pub fn proc_id(&self) -> ProcId {
        self.pid
    }

    /// The flags the snapshot was captured with.
    pub fn flags(&self) -> InfoFlags {
        self.flags
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn parent(&self) -> Option<ProcId> {
        self.parent
    }

    pub fn children(&self) -> &[ProcId] {
        &self.children
    }

    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }

    /// `NAME=VALUE` entries, in the order the OS reports them.
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    #[cfg(feature = "gui-window")]
    pub fn owned_windows(&self) -> &[WindowId] {
        &self.owned_windows
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Capture every field of `pid`.
pub fn proc_info_from_proc_id(pid: ProcId) -> Result<ProcessInfo> {
    proc_info_from_proc_id_ex(pid, InfoFlags::all())
}

/// Capture the fields of `pid` selected by `flags`.
pub fn proc_info_from_proc_id_ex(pid: ProcId, flags: InfoFlags) -> Result<ProcessInfo> {
    if !proc_id_exists(pid) {
        return Err(Error::not_found(pid));
    }

    let info = ProcessInfo {
        pid,
        flags,
        executable_path: read_field(pid, flags, InfoFlags::EXECUTABLE_PATH, "executable", || {
            exe_from_proc_id(pid)
        }),
        working_directory: read_field(pid, flags, InfoFlags::WORKING_DIRECTORY, "cwd", || {
            cwd_from_proc_id(pid)
        }),
        parent: read_field(pid, flags, InfoFlags::PARENT_PROC_ID, "parent", || {
            parent_proc_id_from_proc_id(pid)
        }),
        children: read_field(pid, flags, InfoFlags::CHILD_PROC_IDS, "children", || {
            Native::child_proc_ids(pid)
        })
        .unwrap_or_default(),
        command_line: read_field(pid, flags, InfoFlags::COMMAND_LINE, "cmdline", || {
            Native::command_line(pid)
        })
        .unwrap_or_default(),
        environment: read_field(pid, flags, InfoFlags::ENVIRONMENT, "environ", || {
            Native::environment(pid)
        })
        .unwrap_or_default(),
        #[cfg(feature = "gui-window")]
        owned_windows: read_field(pid, flags, InfoFlags::OWNED_WINDOWS, "windows", || {
            crate::window::owned_windows(pid)
        })
        .unwrap_or_default(),
        captured_at: Utc::now(),
    };

    debug!("Captured info for process {} with flags {:?}", pid, flags);
    Ok(info)
}

fn read_field<T>(
    pid: ProcId,
    requested: InfoFlags,
    field: InfoFlags,
    name: &str,
    read: impl FnOnce() -> Result<T>,
) -> Option<T> {
    if !requested.contains(field) {
        return None;
    }
    match read() {
        Ok(value) => Some(value),
        Err(e) => {
            trace!("Field {} of process {} unavailable: {}", name, pid, e);
            None
        }
    }
}
