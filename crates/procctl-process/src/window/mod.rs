//! Window-to-process bridge.
//!
//! Maps top-level GUI windows to the processes that own them, so that the
//! process control operations can be addressed by window. X11 (EWMH
//! `_NET_CLIENT_LIST` / `_NET_WM_PID`) on Unix desktops, `EnumWindows` on
//! Windows. Other targets report no windows.

use procctl_common::{Error, ProcId, Result, WindowId};
use tracing::debug;

use crate::control;

#[cfg(all(unix, not(target_os = "macos")))]
mod x11;
#[cfg(all(unix, not(target_os = "macos")))]
use x11 as backend;

#[cfg(windows)]
mod win32;
#[cfg(windows)]
use win32 as backend;

#[cfg(not(any(all(unix, not(target_os = "macos")), windows)))]
mod backend {
    use procctl_common::{Error, ProcId, Result};

    pub fn top_level_windows() -> Result<Vec<(usize, ProcId)>> {
        Err(Error::unsupported("window enumeration"))
    }
}

/// Wrap a native window handle.
pub fn window_id_from_native_window(handle: usize) -> WindowId {
    WindowId::from_native(handle)
}

/// Top-level windows owned by `pid`, in stacking-list order.
pub fn owned_windows(pid: ProcId) -> Result<Vec<WindowId>> {
    let windows = backend::top_level_windows()?
        .into_iter()
        .filter(|(_, owner)| *owner == pid)
        .map(|(handle, _)| WindowId::from_native(handle))
        .collect::<Vec<_>>();
    debug!("Process {} owns {} windows", pid, windows.len());
    Ok(windows)
}

/// The process that owns `window`.
pub fn proc_id_from_window_id(window: &WindowId) -> Result<ProcId> {
    let handle = window
        .native()
        .ok_or_else(|| Error::WindowSystem(format!("malformed window id '{}'", window)))?;

    backend::top_level_windows()?
        .into_iter()
        .find(|(candidate, _)| *candidate == handle)
        .map(|(_, owner)| owner)
        .ok_or_else(|| Error::WindowSystem(format!("no top-level window {}", window)))
}

/// Whether `window` is a live top-level window of a live process.
pub fn window_id_exists(window: &WindowId) -> bool {
    proc_id_from_window_id(window)
        .map(crate::check::proc_id_exists)
        .unwrap_or(false)
}

pub fn window_id_suspend(window: &WindowId) -> Result<()> {
    control::suspend(proc_id_from_window_id(window)?)
}

pub fn window_id_resume(window: &WindowId) -> Result<()> {
    control::resume(proc_id_from_window_id(window)?)
}

pub fn window_id_kill(window: &WindowId) -> Result<()> {
    control::kill(proc_id_from_window_id(window)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_window_id() {
        let window = WindowId::from("not-a-window");
        assert!(proc_id_from_window_id(&window).is_err());
        assert!(!window_id_exists(&window));
        assert!(window_id_kill(&window).is_err());
    }

    #[test]
    fn test_native_window_round_trip() {
        let window = window_id_from_native_window(4242);
        assert_eq!(window.as_str(), "4242");
        assert_eq!(window.native(), Some(4242));
    }
}
