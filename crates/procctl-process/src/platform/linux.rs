//! Linux enumeration and introspection straight from `/proc`.

use procctl_common::{Error, ProcId, Result};
use std::fs;
use std::path::PathBuf;
use tracing::trace;

use super::{Enumerate, Introspect, Native, RunState};

const PROC_ROOT: &str = "/proc";

fn proc_path(pid: ProcId, entry: &str) -> PathBuf {
    PathBuf::from(format!("{}/{}/{}", PROC_ROOT, pid, entry))
}

/// `ESRCH` shows up when a process exits between lookup and read.
fn map_io(pid: ProcId, operation: &str, err: std::io::Error) -> Error {
    if err.raw_os_error() == Some(nix::libc::ESRCH) {
        return Error::not_found(pid);
    }
    Error::from_io(pid, operation, err)
}

/// Fields of `/proc/<pid>/stat` the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stat {
    state: char,
    ppid: u32,
}

/// Parses a stat line. The command name sits in parentheses and may itself
/// contain spaces and parentheses, so fields are counted from the last `)`.
fn parse_stat(line: &str) -> Option<Stat> {
    let rest = &line[line.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    let ppid = fields.next()?.parse().ok()?;
    Some(Stat { state, ppid })
}

fn read_stat(pid: ProcId) -> Result<Stat> {
    let line = fs::read_to_string(proc_path(pid, "stat")).map_err(|e| map_io(pid, "stat", e))?;
    parse_stat(&line).ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("malformed stat for {}", pid),
        ))
    })
}

/// Pulls the thread group id out of `/proc/<pid>/status`.
fn parse_tgid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Tgid:"))
        .and_then(|value| value.trim().parse().ok())
}

/// Whether `pid` names a process rather than one of its secondary threads.
///
/// `/proc/<tid>` resolves for every thread even though only thread group
/// leaders are listed, so a bare tid would otherwise pass for a process.
pub(super) fn is_thread_group_leader(pid: ProcId) -> bool {
    fs::read_to_string(proc_path(pid, "status"))
        .ok()
        .and_then(|status| parse_tgid(&status))
        .is_some_and(|tgid| tgid == pid.as_raw())
}

fn ensure_leader(pid: ProcId) -> Result<()> {
    if is_thread_group_leader(pid) {
        Ok(())
    } else {
        Err(Error::not_found(pid))
    }
}

/// Splits a NUL-separated `/proc` file (cmdline, environ).
fn split_nul(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

fn read_nul_separated(pid: ProcId, entry: &str) -> Result<Vec<String>> {
    let bytes = fs::read(proc_path(pid, entry)).map_err(|e| map_io(pid, entry, e))?;
    Ok(split_nul(&bytes))
}

impl Enumerate for Native {
    fn list_proc_ids() -> Result<Vec<ProcId>> {
        let mut pids: Vec<ProcId> = fs::read_dir(PROC_ROOT)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .filter(|raw| *raw != 0)
            .map(ProcId::from_raw)
            .collect();
        pids.sort_unstable();
        trace!("Enumerated {} processes from {}", pids.len(), PROC_ROOT);
        Ok(pids)
    }
}

impl Introspect for Native {
    fn parent_proc_id(pid: ProcId) -> Result<ProcId> {
        ensure_leader(pid)?;
        read_stat(pid).map(|stat| ProcId::from_raw(stat.ppid))
    }

    fn child_proc_ids(pid: ProcId) -> Result<Vec<ProcId>> {
        // Fail early for a vanished parent rather than returning no children.
        ensure_leader(pid)?;

        let children = Self::list_proc_ids()?
            .into_iter()
            .filter(|candidate| {
                // Processes that disappear mid-scan are simply skipped.
                read_stat(*candidate)
                    .map(|stat| stat.ppid == pid.as_raw())
                    .unwrap_or(false)
            })
            .collect();
        Ok(children)
    }

    fn executable_path(pid: ProcId) -> Result<PathBuf> {
        ensure_leader(pid)?;
        fs::read_link(proc_path(pid, "exe")).map_err(|e| map_io(pid, "exe", e))
    }

    fn working_directory(pid: ProcId) -> Result<PathBuf> {
        ensure_leader(pid)?;
        fs::read_link(proc_path(pid, "cwd")).map_err(|e| map_io(pid, "cwd", e))
    }

    fn command_line(pid: ProcId) -> Result<Vec<String>> {
        ensure_leader(pid)?;
        read_nul_separated(pid, "cmdline")
    }

    fn environment(pid: ProcId) -> Result<Vec<String>> {
        ensure_leader(pid)?;
        read_nul_separated(pid, "environ")
    }

    fn run_state(pid: ProcId) -> Result<RunState> {
        ensure_leader(pid)?;
        let state = match read_stat(pid)?.state {
            'T' | 't' => RunState::Stopped,
            'Z' | 'X' | 'x' => RunState::Zombie,
            'R' | 'S' | 'D' | 'I' | 'W' | 'K' | 'P' => RunState::Running,
            _ => RunState::Unknown,
        };
        Ok(state)
    }
}
