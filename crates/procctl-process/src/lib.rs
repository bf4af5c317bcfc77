//! # procctl-process
//!
//! Low-level cross-platform process primitives.
//!
//! This crate provides:
//! - Process enumeration
//! - Per-process introspection snapshots
//! - Suspend, resume and kill
//! - Shell command construction
//! - Window-to-process mapping (feature `gui-window`)

pub mod check;
pub mod control;
pub mod enumerate;
pub mod execute;
pub mod info;
pub mod platform;

#[cfg(feature = "gui-window")]
pub mod window;

// Re-export main types
pub use check::*;
pub use enumerate::{list_all_proc_ids, ProcessList};
pub use execute::{default_shell, shell_command, ShellConfig};
pub use info::{proc_info_from_proc_id, proc_info_from_proc_id_ex, InfoFlags, ProcessInfo};
