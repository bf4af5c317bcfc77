//! Enumeration and introspection through `sysinfo`, for targets without a
//! `/proc` filesystem (macOS, the BSDs, Windows).

use procctl_common::{Error, ProcId, Result};
use std::path::PathBuf;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, System};

use super::{Enumerate, Introspect, Native, RunState};

/// Refreshes just `pid` and hands the process to `f`.
fn with_process<T>(pid: ProcId, f: impl FnOnce(&Process) -> T) -> Result<T> {
    let sysinfo_pid = Pid::from_u32(pid.as_raw());
    let mut system = System::new();
    if !system.refresh_process_specifics(sysinfo_pid, ProcessRefreshKind::everything()) {
        return Err(Error::not_found(pid));
    }
    system
        .process(sysinfo_pid)
        .map(f)
        .ok_or_else(|| Error::not_found(pid))
}

fn all_processes() -> System {
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessRefreshKind::new());
    system
}

impl Enumerate for Native {
    fn list_proc_ids() -> Result<Vec<ProcId>> {
        let system = all_processes();
        let mut pids: Vec<ProcId> = system
            .processes()
            .keys()
            .map(|pid| ProcId::from_raw(pid.as_u32()))
            .filter(|pid| pid.is_valid())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }
}

impl Introspect for Native {
    fn parent_proc_id(pid: ProcId) -> Result<ProcId> {
        with_process(pid, |process| {
            process
                .parent()
                .map(|parent| ProcId::from_raw(parent.as_u32()))
                .unwrap_or(ProcId::INVALID)
        })
    }

    fn child_proc_ids(pid: ProcId) -> Result<Vec<ProcId>> {
        let system = all_processes();
        let parent = Pid::from_u32(pid.as_raw());
        if system.process(parent).is_none() {
            return Err(Error::not_found(pid));
        }
        let mut children: Vec<ProcId> = system
            .processes()
            .values()
            .filter(|process| process.parent() == Some(parent))
            .map(|process| ProcId::from_raw(process.pid().as_u32()))
            .collect();
        children.sort_unstable();
        Ok(children)
    }

    fn executable_path(pid: ProcId) -> Result<PathBuf> {
        with_process(pid, |process| process.exe().map(|p| p.to_path_buf()))?
            .ok_or_else(|| Error::permission_denied(pid, "exe"))
    }

    fn working_directory(pid: ProcId) -> Result<PathBuf> {
        with_process(pid, |process| process.cwd().map(|p| p.to_path_buf()))?
            .ok_or_else(|| Error::permission_denied(pid, "cwd"))
    }

    fn command_line(pid: ProcId) -> Result<Vec<String>> {
        with_process(pid, |process| process.cmd().to_vec())
    }

    fn environment(pid: ProcId) -> Result<Vec<String>> {
        with_process(pid, |process| process.environ().to_vec())
    }

    fn run_state(pid: ProcId) -> Result<RunState> {
        with_process(pid, |process| match process.status() {
            ProcessStatus::Stop | ProcessStatus::Tracing => RunState::Stopped,
            ProcessStatus::Zombie | ProcessStatus::Dead => RunState::Zombie,
            ProcessStatus::Run | ProcessStatus::Sleep | ProcessStatus::Idle => RunState::Running,
            _ => RunState::Unknown,
        })
    }
}
