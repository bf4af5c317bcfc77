//! Per-platform capability implementations.
//!
//! The engine needs four capabilities from the host OS. Each is a trait, and
//! each target OS implements all four on the zero-sized [`Native`] type. The
//! implementation is picked at build time with `cfg`, so every call is
//! statically dispatched.
//!
//! | target            | Enumerate / Introspect | Control        | Launch      |
//! |-------------------|------------------------|----------------|-------------|
//! | Linux             | `/proc`                | `nix` signals  | `/bin/sh -c`|
//! | other Unix        | `sysinfo`              | `nix` signals  | `/bin/sh -c`|
//! | Windows           | `sysinfo`              | `winapi`       | `cmd /C`    |

use procctl_common::{ProcId, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::execute::ShellConfig;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod portable;

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

/// The build target's implementation of every capability trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

/// Scheduling state of a process, as far as control operations care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Stopped by a signal (or suspended).
    Stopped,
    /// Exited but not yet reaped.
    Zombie,
    /// The backend cannot tell.
    Unknown,
}

/// Listing every process on the system.
pub trait Enumerate {
    fn list_proc_ids() -> Result<Vec<ProcId>>;
}

/// Reading the state of one process.
///
/// Errors are `NotFound` when the process is gone and `PermissionDenied`
/// when the OS refuses to show the field.
pub trait Introspect {
    fn parent_proc_id(pid: ProcId) -> Result<ProcId>;

    fn child_proc_ids(pid: ProcId) -> Result<Vec<ProcId>>;

    fn executable_path(pid: ProcId) -> Result<PathBuf>;

    fn working_directory(pid: ProcId) -> Result<PathBuf>;

    fn command_line(pid: ProcId) -> Result<Vec<String>>;

    /// Environment as `NAME=VALUE` entries.
    fn environment(pid: ProcId) -> Result<Vec<String>>;

    fn run_state(pid: ProcId) -> Result<RunState>;
}

/// Signalling a process.
pub trait Control {
    fn exists(pid: ProcId) -> bool;

    fn suspend(pid: ProcId) -> Result<()>;

    fn resume(pid: ProcId) -> Result<()>;

    fn kill(pid: ProcId) -> Result<()>;
}

/// Building commands for the platform command interpreter.
pub trait Launch {
    fn default_shell() -> ShellConfig;

    /// A command that runs `command` through `shell`, untouched.
    fn shell_command(shell: &ShellConfig, command: &str) -> Command {
        let mut cmd = Command::new(&shell.program);
        cmd.args(&shell.args).arg(command);
        cmd
    }
}
