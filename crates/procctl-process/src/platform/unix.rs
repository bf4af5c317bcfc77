//! Signal-based control and `sh -c` launching for every Unix.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use procctl_common::{Error, ProcId, Result};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{Control, Introspect, Launch, Native, RunState};
use crate::execute::ShellConfig;

/// Converts to a `pid_t`, refusing ids that `kill(2)` would treat as a
/// process group (0 and anything that turns negative).
pub(crate) fn to_nix_pid(pid: ProcId) -> Result<Pid> {
    let raw = pid.as_raw();
    if raw == 0 || raw > i32::MAX as u32 {
        return Err(Error::InvalidProcId { raw: u64::from(raw) });
    }
    Ok(Pid::from_raw(raw as i32))
}

fn send(pid: ProcId, signal: Signal) -> Result<()> {
    let nix_pid = to_nix_pid(pid)?;
    kill(nix_pid, signal).map_err(|errno| match errno {
        Errno::ESRCH => Error::not_found(pid),
        Errno::EPERM => Error::permission_denied(pid, signal.as_str()),
        other => Error::Io(other.into()),
    })?;
    debug!("Sent {} to process {}", signal, pid);
    Ok(())
}

fn ensure_live(pid: ProcId) -> Result<()> {
    if Native::exists(pid) {
        Ok(())
    } else {
        Err(Error::not_found(pid))
    }
}

fn run_state(pid: ProcId) -> RunState {
    Native::run_state(pid).unwrap_or(RunState::Unknown)
}

/// How long a stop or continue may take to show up in the run state.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);
const SETTLE_INTERVAL: Duration = Duration::from_millis(5);

/// Waits until the kernel reports the effect of a job-control signal.
///
/// Signals are delivered asynchronously, so without this a second call made
/// straight after the first would still observe the old state.
fn settle(pid: ProcId, signal: Signal, reached: impl Fn(RunState) -> bool) {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    loop {
        let state = run_state(pid);
        if reached(state) {
            return;
        }
        if Instant::now() >= deadline {
            debug!("Process {} still {:?} after {}", pid, state, signal);
            return;
        }
        std::thread::sleep(SETTLE_INTERVAL);
    }
}

/// On Linux a thread id answers `kill(2)` like a process id does.
#[cfg(target_os = "linux")]
fn is_process(pid: ProcId) -> bool {
    super::linux::is_thread_group_leader(pid)
}

#[cfg(not(target_os = "linux"))]
fn is_process(_pid: ProcId) -> bool {
    true
}

impl Control for Native {
    fn exists(pid: ProcId) -> bool {
        let Ok(nix_pid) = to_nix_pid(pid) else {
            return false;
        };

        // Signal 0 only checks deliverability. EPERM still means the process is there.
        let alive = match kill(nix_pid, None::<Signal>) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => false,
        };
        alive && is_process(pid) && run_state(pid) != RunState::Zombie
    }

    fn suspend(pid: ProcId) -> Result<()> {
        ensure_live(pid)?;
        if run_state(pid) == RunState::Stopped {
            return Err(Error::invalid_state(pid, "already suspended"));
        }
        send(pid, Signal::SIGSTOP)?;
        settle(pid, Signal::SIGSTOP, |state| state != RunState::Running);
        Ok(())
    }

    fn resume(pid: ProcId) -> Result<()> {
        ensure_live(pid)?;
        match run_state(pid) {
            RunState::Stopped | RunState::Unknown => send(pid, Signal::SIGCONT)?,
            _ => return Err(Error::invalid_state(pid, "not suspended")),
        }
        settle(pid, Signal::SIGCONT, |state| state != RunState::Stopped);
        Ok(())
    }

    fn kill(pid: ProcId) -> Result<()> {
        ensure_live(pid)?;
        send(pid, Signal::SIGKILL)
    }
}

impl Launch for Native {
    fn default_shell() -> ShellConfig {
        #[cfg(target_os = "android")]
        let program = "/system/bin/sh";
        #[cfg(not(target_os = "android"))]
        let program = "/bin/sh";

        ShellConfig {
            program: program.to_string(),
            args: vec!["-c".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procctl_common::ErrorKind;

    #[test]
    fn test_to_nix_pid_rejects_group_ids() {
        assert!(to_nix_pid(ProcId::INVALID).is_err());
        assert!(to_nix_pid(ProcId::from_raw(u32::MAX)).is_err());
        assert_eq!(to_nix_pid(ProcId::from_raw(1)).unwrap(), Pid::from_raw(1));
    }

    #[test]
    fn test_self_exists() {
        assert!(Native::exists(ProcId::from_raw(std::process::id())));
        assert!(!Native::exists(ProcId::INVALID));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_secondary_thread_cannot_be_controlled() {
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (tid_tx, tid_rx) = std::sync::mpsc::channel();
        let worker = std::thread::spawn(move || {
            tid_tx.send(nix::unistd::gettid().as_raw() as u32).unwrap();
            let _ = stop_rx.recv();
        });
        let tid = ProcId::from_raw(tid_rx.recv().unwrap());

        assert!(!Native::exists(tid));
        assert_eq!(Native::kill(tid).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(Native::suspend(tid).unwrap_err().kind(), ErrorKind::NotFound);

        stop_tx.send(()).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_kill_missing_process() {
        let missing = ProcId::from_raw(i32::MAX as u32);
        let err = Native::kill(missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_default_shell_runs_command() {
        let status = Native::shell_command(&Native::default_shell(), "exit 3")
            .status()
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
