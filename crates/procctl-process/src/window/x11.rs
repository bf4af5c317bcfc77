//! X11 backend via EWMH properties.

use procctl_common::{Error, ProcId, Result};
use tracing::trace;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};

fn x11_error(e: impl std::fmt::Display) -> Error {
    Error::WindowSystem(e.to_string())
}

fn intern(conn: &impl Connection, name: &[u8]) -> Result<u32> {
    Ok(conn
        .intern_atom(false, name)
        .map_err(x11_error)?
        .reply()
        .map_err(x11_error)?
        .atom)
}

/// Every managed client window with its `_NET_WM_PID`.
///
/// Windows that do not advertise a pid, or that vanish mid-scan, are skipped.
pub fn top_level_windows() -> Result<Vec<(usize, ProcId)>> {
    let (conn, screen_num) = x11rb::connect(None).map_err(x11_error)?;
    let root = conn
        .setup()
        .roots
        .get(screen_num)
        .map(|screen| screen.root)
        .ok_or_else(|| Error::WindowSystem(format!("no screen {}", screen_num)))?;

    let client_list = intern(&conn, b"_NET_CLIENT_LIST")?;
    let wm_pid = intern(&conn, b"_NET_WM_PID")?;

    let clients: Vec<Window> = conn
        .get_property(false, root, client_list, AtomEnum::WINDOW, 0, u32::MAX)
        .map_err(x11_error)?
        .reply()
        .map_err(x11_error)?
        .value32()
        .map(|values| values.collect())
        .unwrap_or_default();

    let mut windows = Vec::with_capacity(clients.len());
    for window in clients {
        let reply = match conn
            .get_property(false, window, wm_pid, AtomEnum::CARDINAL, 0, 1)
            .map_err(x11_error)?
            .reply()
        {
            Ok(reply) => reply,
            Err(e) => {
                trace!("Skipping window {}: {}", window, e);
                continue;
            }
        };
        if let Some(pid) = reply.value32().and_then(|mut values| values.next()) {
            windows.push((window as usize, ProcId::from_raw(pid)));
        }
    }
    Ok(windows)
}
