//! Error types for the procctl crates.
//!
//! # Rust Learning Note
//!
//! Every fallible operation in the lower crates returns `Result<T>`. The
//! engine facade is the only place where an error is collapsed to a `false`
//! or sentinel return, so the reason is still available (and logged) right
//! up to the boundary.
//!
//! ```rust
//! use procctl_common::{Error, ErrorKind, ProcId, Result};
//!
//! fn lookup(pid: ProcId) -> Result<()> {
//!     Err(Error::not_found(pid))
//! }
//!
//! let err = lookup(ProcId::from_raw(4242)).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! ```

use thiserror::Error;

use crate::types::ProcId;

/// Result type alias for procctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// These are the recoverable conditions a caller is expected to check for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The target process or window does not correspond to a live process.
    NotFound,
    /// The OS refused the request for lack of privilege.
    PermissionDenied,
    /// The OS (or the handle space) ran out of room.
    ResourceExhausted,
    /// A freed, never-issued or out-of-range handle or index.
    InvalidHandle,
    /// Stream operation on a child whose stdio has been torn down.
    PipeClosed,
    /// The running platform cannot perform the operation.
    Unsupported,
    /// Anything else, usually an unexpected I/O failure.
    Other,
}

/// Main error type for procctl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No live process with this id.
    #[error("Process not found: {pid}")]
    NotFound { pid: ProcId },

    /// The OS refused access to the process.
    #[error("Permission denied: {pid} - {operation}")]
    PermissionDenied { pid: ProcId, operation: String },

    /// Spawning failed because of an OS limit.
    #[error("Resource exhausted: {reason}")]
    ResourceExhausted { reason: String },

    /// Spawning failed for any other reason (bad path, bad shell, ...).
    #[error("Spawn failed: {command} - {reason}")]
    SpawnFailed { command: String, reason: String },

    /// A handle that is not (or no longer) registered.
    #[error("Invalid handle: {handle}")]
    InvalidHandle { handle: String },

    /// Index outside a snapshot's bounds.
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A process id that can never name a process (0, or too large to be a
    /// POSIX `pid_t`).
    #[error("Invalid process id: {raw}")]
    InvalidProcId { raw: u64 },

    /// The requested state transition does not apply (e.g. suspending a
    /// process that is already stopped).
    #[error("Invalid state: {pid} - {reason}")]
    InvalidState { pid: ProcId, reason: String },

    /// The child's pipe has been closed.
    #[error("Pipe closed: {stream}")]
    PipeClosed { stream: String },

    /// Not available on this platform or build.
    #[error("Unsupported: {operation}")]
    Unsupported { operation: String },

    /// Window system failure (feature `gui-window`).
    #[error("Window system error: {0}")]
    WindowSystem(String),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a NotFound error.
    pub fn not_found(pid: ProcId) -> Self {
        Self::NotFound { pid }
    }

    /// Creates a PermissionDenied error.
    pub fn permission_denied(pid: ProcId, operation: impl Into<String>) -> Self {
        Self::PermissionDenied {
            pid,
            operation: operation.into(),
        }
    }

    pub fn resource_exhausted(reason: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            reason: reason.into(),
        }
    }

    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_handle(handle: impl std::fmt::Display) -> Self {
        Self::InvalidHandle {
            handle: handle.to_string(),
        }
    }

    pub fn invalid_state(pid: ProcId, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            pid,
            reason: reason.into(),
        }
    }

    pub fn pipe_closed(stream: impl Into<String>) -> Self {
        Self::PipeClosed {
            stream: stream.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Maps an I/O error raised while touching `pid` onto the taxonomy.
    ///
    /// `ENOENT`/`ESRCH` style failures become [`Error::NotFound`] and access
    /// failures become [`Error::PermissionDenied`]; everything else stays an
    /// I/O error.
    pub fn from_io(pid: ProcId, operation: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(pid),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(pid, operation),
            _ => Self::Io(err).context(format!("{} failed for {}", operation, pid)),
        }
    }

    /// Maps a spawn failure onto the taxonomy.
    pub fn from_spawn(command: &str, err: std::io::Error) -> Self {
        if is_exhaustion(&err) {
            return Self::resource_exhausted(format!("cannot spawn '{}': {}", command, err));
        }
        Self::spawn_failed(command, err.to_string())
    }

    /// Adds context to an error.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Error::InvalidHandle { .. }
            | Error::IndexOutOfRange { .. }
            | Error::InvalidProcId { .. } => ErrorKind::InvalidHandle,
            Error::PipeClosed { .. } => ErrorKind::PipeClosed,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Io(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                ErrorKind::PipeClosed
            }
            Error::WithContext { source, .. } => source.kind(),
            Error::SpawnFailed { .. }
            | Error::InvalidState { .. }
            | Error::WindowSystem(_)
            | Error::Io(_) => ErrorKind::Other,
        }
    }
}

fn is_exhaustion(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::OutOfMemory
        || err.raw_os_error().is_some_and(is_exhaustion_code)
}

#[cfg(unix)]
fn is_exhaustion_code(code: i32) -> bool {
    use nix::errno::Errno;

    matches!(
        Errno::from_raw(code),
        Errno::EAGAIN | Errno::ENOMEM | Errno::EMFILE | Errno::ENFILE
    )
}

#[cfg(windows)]
fn is_exhaustion_code(code: i32) -> bool {
    use winapi::shared::winerror::{
        ERROR_NOT_ENOUGH_MEMORY, ERROR_NO_SYSTEM_RESOURCES, ERROR_OUTOFMEMORY,
    };

    matches!(
        code as u32,
        ERROR_NOT_ENOUGH_MEMORY | ERROR_OUTOFMEMORY | ERROR_NO_SYSTEM_RESOURCES
    )
}

#[cfg(not(any(unix, windows)))]
fn is_exhaustion_code(_code: i32) -> bool {
    false
}

// Convenience methods for Result types
pub trait ResultExt<T> {
    /// Adds context to an error result.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::not_found(ProcId::from_raw(42));
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "Process not found: 42");
    }

    #[test]
    fn test_error_context_keeps_kind() {
        let err = Error::permission_denied(ProcId::from_raw(1), "kill").context("Control failed");

        assert!(err.to_string().contains("Control failed"));
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_result_context_wraps_error() {
        let failed: Result<()> = Err(Error::not_found(ProcId::from_raw(9)));
        let err = failed.context("reading cmdline").unwrap_err();

        assert!(matches!(err, Error::WithContext { .. }));
        assert!(err.to_string().contains("reading cmdline"));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let ok: Result<u8> = Ok(1);
        assert_eq!(ok.context("unused").unwrap(), 1);
    }

    #[test]
    fn test_from_io_classification() {
        let pid = ProcId::from_raw(7);
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");

        assert_eq!(Error::from_io(pid, "read", missing).kind(), ErrorKind::NotFound);
        assert_eq!(Error::from_io(pid, "read", denied).kind(), ErrorKind::PermissionDenied);
        assert_eq!(Error::from_io(pid, "write", broken).kind(), ErrorKind::PipeClosed);
    }

    #[test]
    fn test_spawn_classification() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert!(matches!(
            Error::from_spawn("nope", missing),
            Error::SpawnFailed { .. }
        ));

        let oom = std::io::Error::from(std::io::ErrorKind::OutOfMemory);
        assert_eq!(Error::from_spawn("big", oom).kind(), ErrorKind::ResourceExhausted);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_limits_are_resource_exhausted() {
        use nix::errno::Errno;

        for errno in [Errno::EAGAIN, Errno::ENOMEM, Errno::EMFILE, Errno::ENFILE] {
            let err = std::io::Error::from_raw_os_error(errno as i32);
            assert_eq!(
                Error::from_spawn("fork-bomb", err).kind(),
                ErrorKind::ResourceExhausted,
                "{}",
                errno
            );
        }

        let denied = std::io::Error::from_raw_os_error(Errno::EACCES as i32);
        assert_eq!(Error::from_spawn("locked", denied).kind(), ErrorKind::Other);
    }

    #[cfg(windows)]
    #[test]
    fn test_spawn_limits_are_resource_exhausted() {
        use winapi::shared::winerror::ERROR_NO_SYSTEM_RESOURCES;

        let err = std::io::Error::from_raw_os_error(ERROR_NO_SYSTEM_RESOURCES as i32);
        assert_eq!(Error::from_spawn("cmd", err).kind(), ErrorKind::ResourceExhausted);
    }

    #[test]
    fn test_index_errors_are_invalid_handle() {
        let err = Error::IndexOutOfRange { index: 3, len: 1 };
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    }
}
