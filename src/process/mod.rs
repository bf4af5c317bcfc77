//! Children executed by the engine.

pub mod launcher;

pub use launcher::{spawn, Completion, ExecutedProcess};
