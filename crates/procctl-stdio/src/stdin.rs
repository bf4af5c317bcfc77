//! The calling process's own standard input.

use std::io;

/// Read whatever is pending on this process's stdin without waiting.
///
/// Returns an empty string when nothing is available or stdin is at EOF.
#[cfg(unix)]
pub fn read_current_standard_input() -> io::Result<String> {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use std::os::fd::{AsFd, AsRawFd};

    let stdin = io::stdin();
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        if poll(&mut fds, PollTimeout::ZERO)? == 0 {
            break;
        }
        let ready = fds[0].revents().unwrap_or(PollFlags::empty());
        if !ready.intersects(PollFlags::POLLIN | PollFlags::POLLHUP) {
            break;
        }
        match nix::unistd::read(stdin.as_raw_fd(), &mut chunk) {
            Ok(0) => break,
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
            Err(nix::errno::Errno::EINTR) => continue,
            Err(nix::errno::Errno::EAGAIN) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(String::from_utf8_lossy(&pending).into_owned())
}

/// Read one line from this process's stdin.
///
/// Console handles cannot be polled portably, so this blocks until a line
/// (or EOF) arrives.
#[cfg(not(unix))]
pub fn read_current_standard_input() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
