//! Process control primitives.
//!
//! Suspend, resume and kill addressed by process id. SIGSTOP / SIGCONT /
//! SIGKILL on Unix; thread suspension and TerminateProcess on Windows.
//!
//! Every operation refuses to act when it would be a no-op: suspending a
//! stopped process, resuming a running one or killing a process that no
//! longer exists all fail without touching the target.

use procctl_common::{ProcId, Result};

use crate::platform::{Control, Introspect, Native, RunState};

/// Suspend a running process.
pub fn suspend(pid: ProcId) -> Result<()> {
    Native::suspend(pid)
}

/// Resume a suspended process.
pub fn resume(pid: ProcId) -> Result<()> {
    Native::resume(pid)
}

/// Force kill a process (SIGKILL on Unix, TerminateProcess on Windows).
pub fn kill(pid: ProcId) -> Result<()> {
    Native::kill(pid)
}

/// Whether the process is currently stopped.
pub fn is_suspended(pid: ProcId) -> bool {
    matches!(Native::run_state(pid), Ok(RunState::Stopped))
}
