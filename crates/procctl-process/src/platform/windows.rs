//! Win32 process control and `cmd /C` launching.

#![allow(unsafe_code)]

use procctl_common::{Error, ProcId, Result};
use std::os::windows::process::CommandExt;
use std::process::Command;
use tracing::debug;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{
    GetExitCodeProcess, OpenProcess, OpenThread, ResumeThread, SuspendThread, TerminateProcess,
};
use winapi::um::tlhelp32::{CreateToolhelp32Snapshot, Thread32First, Thread32Next, THREADENTRY32, TH32CS_SNAPTHREAD};
use winapi::um::winnt::{HANDLE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE, THREAD_SUSPEND_RESUME};

use super::{Control, Launch, Native};
use crate::execute::ShellConfig;

/// Closes the wrapped handle on drop.
struct OwnedHandle(HANDLE);

impl OwnedHandle {
    fn open_process(pid: ProcId, access: DWORD) -> Result<Self> {
        // Safety: OpenProcess has no preconditions; a null return is checked.
        let handle = unsafe { OpenProcess(access, FALSE, pid.as_raw()) };
        if handle.is_null() {
            return Err(Error::from_io(pid, "OpenProcess", std::io::Error::last_os_error()));
        }
        Ok(Self(handle))
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // Safety: the handle came from a successful Open*/Create* call.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// Ids of every thread owned by `pid`.
fn thread_ids(pid: ProcId) -> Result<Vec<DWORD>> {
    // Safety: snapshot creation has no preconditions; failure is checked.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0) };
    if snapshot == INVALID_HANDLE_VALUE {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }
    let snapshot = OwnedHandle(snapshot);

    let mut entry: THREADENTRY32 = unsafe { std::mem::zeroed() };
    entry.dwSize = std::mem::size_of::<THREADENTRY32>() as DWORD;

    let mut threads = Vec::new();
    // Safety: entry is a properly sized THREADENTRY32 that outlives the calls.
    let mut more = unsafe { Thread32First(snapshot.0, &mut entry) } != FALSE;
    while more {
        if entry.th32OwnerProcessID == pid.as_raw() {
            threads.push(entry.th32ThreadID);
        }
        more = unsafe { Thread32Next(snapshot.0, &mut entry) } != FALSE;
    }

    if threads.is_empty() {
        return Err(Error::not_found(pid));
    }
    Ok(threads)
}

/// Applies `op` to every thread and returns the previous suspend counts.
fn for_each_thread(pid: ProcId, op: unsafe extern "system" fn(HANDLE) -> DWORD) -> Result<Vec<DWORD>> {
    let mut previous = Vec::new();
    for tid in thread_ids(pid)? {
        // Safety: a null handle is checked before use.
        let handle = unsafe { OpenThread(THREAD_SUSPEND_RESUME, FALSE, tid) };
        if handle.is_null() {
            // Threads can exit between the snapshot and now.
            continue;
        }
        let thread = OwnedHandle(handle);
        let count = unsafe { op(thread.0) };
        if count == DWORD::MAX {
            return Err(Error::from_io(pid, "suspend/resume", std::io::Error::last_os_error()));
        }
        previous.push(count);
    }
    Ok(previous)
}

impl Control for Native {
    fn exists(pid: ProcId) -> bool {
        if !pid.is_valid() {
            return false;
        }
        let Ok(process) = OwnedHandle::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION) else {
            return false;
        };
        let mut code: DWORD = 0;
        // Safety: the handle is live and `code` is a valid out pointer.
        let ok = unsafe { GetExitCodeProcess(process.0, &mut code) } != FALSE;
        ok && code == STILL_ACTIVE
    }

    fn suspend(pid: ProcId) -> Result<()> {
        if !Self::exists(pid) {
            return Err(Error::not_found(pid));
        }
        let previous = for_each_thread(pid, SuspendThread)?;
        if !previous.is_empty() && previous.iter().all(|count| *count > 0) {
            // Already suspended: undo our extra suspension.
            for_each_thread(pid, ResumeThread)?;
            return Err(Error::invalid_state(pid, "already suspended"));
        }
        debug!("Suspended process {}", pid);
        Ok(())
    }

    fn resume(pid: ProcId) -> Result<()> {
        if !Self::exists(pid) {
            return Err(Error::not_found(pid));
        }
        let previous = for_each_thread(pid, ResumeThread)?;
        if previous.iter().all(|count| *count == 0) {
            return Err(Error::invalid_state(pid, "not suspended"));
        }
        debug!("Resumed process {}", pid);
        Ok(())
    }

    fn kill(pid: ProcId) -> Result<()> {
        if !Self::exists(pid) {
            return Err(Error::not_found(pid));
        }
        let process = OwnedHandle::open_process(pid, PROCESS_TERMINATE)?;
        // Safety: the handle was opened with PROCESS_TERMINATE.
        if unsafe { TerminateProcess(process.0, 1) } == FALSE {
            return Err(Error::from_io(pid, "TerminateProcess", std::io::Error::last_os_error()));
        }
        debug!("Terminated process {}", pid);
        Ok(())
    }
}

impl Launch for Native {
    fn default_shell() -> ShellConfig {
        let program = std::env::var("ComSpec").unwrap_or_else(|_| "cmd.exe".to_string());
        ShellConfig {
            program,
            args: vec!["/C".to_string()],
        }
    }

    // cmd.exe does its own parsing, so the command line is passed verbatim.
    fn shell_command(shell: &ShellConfig, command: &str) -> Command {
        let mut cmd = Command::new(&shell.program);
        cmd.args(&shell.args).raw_arg(command);
        cmd
    }
}
