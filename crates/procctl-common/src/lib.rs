//! # procctl common
//!
//! Types shared by every procctl crate:
//! - Process ids and engine-issued handles
//! - The error taxonomy and `Result` alias

pub mod errors;
pub mod types;

pub use errors::{Error, ErrorKind, Result, ResultExt};
pub use types::{
    Handle, InfoHandle, ListHandle, ProcId, ProcessHandle, WindowId, MAX_BOUNDARY_HANDLE,
};
