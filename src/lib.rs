// procctl Library
//
// This library provides a uniform process engine: enumeration, control and
// introspection of OS processes, shell execution with bidirectional
// standard-stream I/O, and environment and directory accessors.
//
// Startup: load an `EngineConfig`, pass it to `logging::init_from_config`,
// then build the engine with `ProcessEngine::new`.

pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod process;
pub mod registry;
pub mod utils;

// Re-export main types for easy use
pub use config::{EngineConfig, StdioConfig};
pub use engine::{Execution, ProcessEngine};
pub use errors::{EngineError, EngineResult};
pub use logging::init_from_config;
pub use process::Completion;

pub use procctl_common::{
    Error, ErrorKind, Handle, InfoHandle, ListHandle, ProcId, ProcessHandle, Result, WindowId,
};
pub use procctl_process::{InfoFlags, ProcessInfo, ProcessList, ShellConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
