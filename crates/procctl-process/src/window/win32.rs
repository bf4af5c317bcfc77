//! Win32 backend via `EnumWindows`.

#![allow(unsafe_code)]

use procctl_common::{Error, ProcId, Result};
use winapi::shared::minwindef::{BOOL, DWORD, LPARAM, TRUE};
use winapi::shared::windef::HWND;
use winapi::um::winuser::{EnumWindows, GetWindowThreadProcessId};

unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // Safety: lparam is the &mut Vec passed to EnumWindows below, alive for
    // the whole enumeration.
    let windows = &mut *(lparam as *mut Vec<(usize, ProcId)>);
    let mut pid: DWORD = 0;
    GetWindowThreadProcessId(hwnd, &mut pid);
    if pid != 0 {
        windows.push((hwnd as usize, ProcId::from_raw(pid)));
    }
    TRUE
}

/// Every top-level window with its owning process.
pub fn top_level_windows() -> Result<Vec<(usize, ProcId)>> {
    let mut windows: Vec<(usize, ProcId)> = Vec::new();
    // Safety: the callback only touches `windows` through lparam.
    let ok = unsafe { EnumWindows(Some(collect), &mut windows as *mut _ as LPARAM) };
    if ok == 0 {
        return Err(Error::WindowSystem(format!(
            "EnumWindows failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(windows)
}
