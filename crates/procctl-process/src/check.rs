//! Process existence and direct single-field queries.
//!
//! These read one fact about one process without building a snapshot.

use procctl_common::{ProcId, Result};
use std::path::PathBuf;

use crate::platform::{Control, Introspect, Native};

/// The calling process. Never needs enumeration.
pub fn proc_id_from_self() -> ProcId {
    ProcId::from_raw(std::process::id())
}

/// Parent of the calling process, or `ProcId::INVALID` when it cannot be read.
pub fn parent_proc_id_from_self() -> ProcId {
    #[cfg(unix)]
    {
        ProcId::from_raw(nix::unistd::getppid().as_raw() as u32)
    }

    #[cfg(not(unix))]
    {
        Native::parent_proc_id(proc_id_from_self()).unwrap_or(ProcId::INVALID)
    }
}

/// Whether `pid` names a live (non-zombie) process.
pub fn proc_id_exists(pid: ProcId) -> bool {
    pid == proc_id_from_self() || Native::exists(pid)
}

pub fn parent_proc_id_from_proc_id(pid: ProcId) -> Result<ProcId> {
    if pid == proc_id_from_self() {
        return Ok(parent_proc_id_from_self());
    }
    Native::parent_proc_id(pid)
}

pub fn child_proc_ids(pid: ProcId) -> Result<Vec<ProcId>> {
    Native::child_proc_ids(pid)
}

pub fn executable_from_self() -> Result<PathBuf> {
    Ok(std::env::current_exe()?)
}

pub fn exe_from_proc_id(pid: ProcId) -> Result<PathBuf> {
    Native::executable_path(pid)
}

pub fn cwd_from_proc_id(pid: ProcId) -> Result<PathBuf> {
    if pid == proc_id_from_self() {
        return Ok(std::env::current_dir()?);
    }
    Native::working_directory(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_always_exists() {
        assert!(proc_id_exists(proc_id_from_self()));
    }

    #[test]
    fn test_parent_of_self_matches() {
        let parent = parent_proc_id_from_self();
        assert!(parent.is_valid());
        assert_eq!(parent_proc_id_from_proc_id(proc_id_from_self()).unwrap(), parent);
    }

    #[test]
    fn test_invalid_pid_does_not_exist() {
        assert!(!proc_id_exists(ProcId::INVALID));
    }

    #[test]
    fn test_self_paths() {
        let exe = executable_from_self().unwrap();
        assert!(exe.is_absolute());
        assert_eq!(exe_from_proc_id(proc_id_from_self()).unwrap(), exe);
        assert!(cwd_from_proc_id(proc_id_from_self()).unwrap().is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_child_is_listed() {
        let mut child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let pid = ProcId::from_raw(child.id());

        assert!(proc_id_exists(pid));
        assert_eq!(parent_proc_id_from_proc_id(pid).unwrap(), proc_id_from_self());
        assert!(child_proc_ids(proc_id_from_self()).unwrap().contains(&pid));

        child.kill().unwrap();
        child.wait().unwrap();
        assert!(!proc_id_exists(pid));
    }
}
