//! # procctl-stdio
//!
//! Standard-stream plumbing for executed children.
//!
//! This crate provides:
//! - Bounded output buffers that drop the oldest bytes
//! - Async pumps that drain child pipes into those buffers
//! - Non-blocking reads of the calling process's own stdin

pub mod buffer;
pub mod capture;
pub mod stdin;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use buffer::{BufferLimit, OutputBuffer, SharedBuffer, DEFAULT_BUFFER_LIMIT};
pub use capture::{pump_output, DEFAULT_READ_CHUNK_SIZE};
pub use stdin::read_current_standard_input;

/// Which child stream a pump is draining.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamSource::Stdout => write!(f, "stdout"),
            StreamSource::Stderr => write!(f, "stderr"),
        }
    }
}
