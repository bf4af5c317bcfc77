//! The `ProcessEngine` facade.
//!
//! This is the boundary surface: every operation takes and returns plain
//! values, identifiers and handles. Failures never escape as errors. They
//! are logged and collapsed to `false`, an empty string, `0` or an invalid
//! sentinel. Callers that want the reason should use the `procctl_process`
//! and `procctl_stdio` APIs directly.
//!
//! Mutating operations take `&mut self`. Operations that block (`execute`,
//! stdin writes) drive the engine runtime, so the engine must be used from
//! synchronous code, not from inside another async runtime.

use chrono::Utc;
use procctl_common::{
    Error, Handle, InfoHandle, ListHandle, ProcId, ProcessHandle, Result,
};
use procctl_process::{
    check, control, list_all_proc_ids, proc_info_from_proc_id_ex, InfoFlags, ProcessInfo,
    ProcessList,
};
use procctl_stdio::{read_current_standard_input, BufferLimit};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

#[cfg(feature = "gui-window")]
use procctl_common::WindowId;
#[cfg(feature = "gui-window")]
use procctl_process::window;

use crate::config::EngineConfig;
use crate::context::ProcessContext;
use crate::errors::{EngineError, EngineResult};
use crate::process::{self as launcher, Completion, ExecutedProcess};
use crate::registry::HandleRegistry;
use crate::utils::path_to_string;

/// Outcome of a blocking [`ProcessEngine::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// Keeps the captured output readable until freed.
    pub handle: ProcessHandle,
    pub proc_id: ProcId,
    /// `None` when the spawn failed or a signal ended the child.
    pub exit_code: Option<i32>,
}

impl Execution {
    fn failed() -> Self {
        Self {
            handle: ProcessHandle::INVALID,
            proc_id: ProcId::INVALID,
            exit_code: None,
        }
    }
}

pub struct ProcessEngine {
    config: EngineConfig,
    runtime: Runtime,
    buffer_limit: BufferLimit,
    processes: HandleRegistry<ProcessHandle, ExecutedProcess>,
    lists: HandleRegistry<ListHandle, ProcessList>,
    infos: HandleRegistry<InfoHandle, ProcessInfo>,
    context: ProcessContext,
}

fn collapse<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} failed: {}", operation, e);
            None
        }
    }
}

fn indexed<T: Clone>(items: &[T], index: usize) -> Result<T> {
    items.get(index).cloned().ok_or(Error::IndexOutOfRange {
        index,
        len: items.len(),
    })
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.io_threads)
            .thread_name("procctl-io")
            .enable_all()
            .build()
            .map_err(|e| EngineError::runtime(format!("failed to start I/O runtime: {}", e)))?;

        info!(
            "Process engine started (shell: {}, buffer limit: {} bytes)",
            config.shell.program, config.stdio.buffer_limit
        );

        Ok(Self {
            buffer_limit: BufferLimit::new(config.stdio.buffer_limit),
            config,
            runtime,
            processes: HandleRegistry::new(),
            lists: HandleRegistry::new(),
            infos: HandleRegistry::new(),
            context: ProcessContext::new(),
        })
    }

    pub fn with_defaults() -> EngineResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::new(EngineConfig::load_from_file(path)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Launcher

    /// Run `command` through the shell and wait for it to finish.
    ///
    /// The child's stdin is the null device. Its output stays readable
    /// through the returned handle until [`Self::free_standard_output`].
    pub fn execute(&mut self, command: &str) -> Execution {
        let child = match launcher::spawn(&self.runtime, command, &self.config, &self.buffer_limit, false) {
            Ok(child) => child,
            Err(e) => {
                warn!("execute failed: {}", e);
                return Execution::failed();
            }
        };

        let completion = child.wait(&self.runtime);
        let proc_id = child.proc_id();
        let exit_code = completion.exit_code();
        let elapsed = Utc::now().signed_duration_since(child.started_at());
        debug!(
            "Process {} ({}) finished after {}ms: {:?}",
            proc_id,
            child.command(),
            elapsed.num_milliseconds(),
            completion
        );

        let handle = collapse("execute", self.processes.insert(child)).unwrap_or(ProcessHandle::INVALID);
        Execution {
            handle,
            proc_id,
            exit_code,
        }
    }

    /// Start `command` through the shell and return immediately.
    pub fn execute_async(&mut self, command: &str) -> ProcessHandle {
        let spawned = launcher::spawn(&self.runtime, command, &self.config, &self.buffer_limit, true);
        collapse("execute_async", spawned.and_then(|child| self.processes.insert(child)))
            .unwrap_or(ProcessHandle::INVALID)
    }

    /// Whether the child has completed. False for unknown or freed handles.
    pub fn completion_status(&self, handle: ProcessHandle) -> bool {
        self.processes
            .get(handle)
            .map(ExecutedProcess::is_complete)
            .unwrap_or(false)
    }

    /// Like [`Self::completion_status`], but `None` for unknown handles.
    pub fn completion(&self, handle: ProcessHandle) -> Option<Completion> {
        self.processes.get(handle).map(ExecutedProcess::completion)
    }

    pub fn exit_code(&self, handle: ProcessHandle) -> Option<i32> {
        self.processes.get(handle).and_then(ExecutedProcess::exit_code)
    }

    pub fn proc_id_from_handle(&self, handle: ProcessHandle) -> ProcId {
        collapse("proc_id_from_handle", self.processes.require(handle))
            .map(ExecutedProcess::proc_id)
            .unwrap_or(ProcId::INVALID)
    }

    // Stream I/O

    /// Write to the child's stdin. Returns the number of bytes written.
    pub fn write_to_standard_input(&mut self, handle: ProcessHandle, data: &str) -> usize {
        let timeout = self.config.stdio.stdin_write_timeout;
        let result = self
            .processes
            .require_mut(handle)
            .and_then(|child| child.write_stdin(&self.runtime, data.as_bytes(), timeout));
        collapse("write_to_standard_input", result).unwrap_or(0)
    }

    /// Output retained so far. Reading does not consume it.
    pub fn read_from_standard_output(&self, handle: ProcessHandle) -> String {
        collapse("read_from_standard_output", self.processes.require(handle))
            .map(|child| child.output().read_lossy())
            .unwrap_or_default()
    }

    /// Whatever is pending on this process's own stdin.
    pub fn current_process_read_from_standard_input(&self) -> String {
        collapse(
            "current_process_read_from_standard_input",
            read_current_standard_input().map_err(Error::Io),
        )
        .unwrap_or_default()
    }

    /// Cap the retained output of every child, current and future.
    pub fn set_buffer_limit(&mut self, limit: usize) {
        self.buffer_limit.set(limit);
        debug!("Buffer limit set to {} bytes", limit);
    }

    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit.get()
    }

    /// Close the child's stdin.
    pub fn free_standard_input(&mut self, handle: ProcessHandle) -> bool {
        let closed = collapse("free_standard_input", self.processes.require_mut(handle))
            .map(ExecutedProcess::close_stdin);
        match closed {
            Some(true) => true,
            Some(false) => {
                warn!("free_standard_input: stdin of {} already released", handle);
                false
            }
            None => false,
        }
    }

    /// Discard retained output.
    ///
    /// Once the child has completed and its stdin is released, this also
    /// releases the handle itself.
    pub fn free_standard_output(&mut self, handle: ProcessHandle) -> bool {
        let Some(child) = collapse("free_standard_output", self.processes.require(handle)) else {
            return false;
        };
        child.output().clear();

        if child.is_complete() && !child.stdin_open() {
            self.processes.remove(handle);
            debug!("Released {}", handle);
        }
        true
    }

    // Process control

    pub fn proc_id_exists(&self, pid: ProcId) -> bool {
        check::proc_id_exists(pid)
    }

    pub fn proc_id_suspend(&self, pid: ProcId) -> bool {
        collapse("proc_id_suspend", control::suspend(pid)).is_some()
    }

    pub fn proc_id_resume(&self, pid: ProcId) -> bool {
        collapse("proc_id_resume", control::resume(pid)).is_some()
    }

    pub fn proc_id_kill(&self, pid: ProcId) -> bool {
        collapse("proc_id_kill", control::kill(pid)).is_some()
    }

    pub fn proc_id_is_suspended(&self, pid: ProcId) -> bool {
        control::is_suspended(pid)
    }

    // Introspection

    pub fn proc_info_from_proc_id(&mut self, pid: ProcId) -> InfoHandle {
        self.proc_info_from_proc_id_ex(pid, InfoFlags::all())
    }

    /// Snapshot the fields of `pid` selected by `flags`.
    pub fn proc_info_from_proc_id_ex(&mut self, pid: ProcId, flags: InfoFlags) -> InfoHandle {
        let captured = proc_info_from_proc_id_ex(pid, flags).and_then(|info| self.infos.insert(info));
        collapse("proc_info_from_proc_id", captured).unwrap_or(InfoHandle::INVALID)
    }

    fn with_info<T>(
        &self,
        operation: &str,
        handle: InfoHandle,
        read: impl FnOnce(&ProcessInfo) -> Result<T>,
    ) -> Option<T> {
        collapse(operation, self.infos.require(handle).and_then(read))
    }

    pub fn executable_image_file_path(&self, info: InfoHandle) -> String {
        self.with_info("executable_image_file_path", info, |info| {
            Ok(info.executable_path().map(path_to_string).unwrap_or_default())
        })
        .unwrap_or_default()
    }

    pub fn current_working_directory(&self, info: InfoHandle) -> String {
        self.with_info("current_working_directory", info, |info| {
            Ok(info.working_directory().map(path_to_string).unwrap_or_default())
        })
        .unwrap_or_default()
    }

    pub fn parent_process_id(&self, info: InfoHandle) -> ProcId {
        self.with_info("parent_process_id", info, |info| {
            Ok(info.parent().unwrap_or(ProcId::INVALID))
        })
        .unwrap_or(ProcId::INVALID)
    }

    pub fn child_process_id(&self, info: InfoHandle, index: usize) -> ProcId {
        self.with_info("child_process_id", info, |info| indexed(info.children(), index))
            .unwrap_or(ProcId::INVALID)
    }

    pub fn child_process_id_length(&self, info: InfoHandle) -> usize {
        self.with_info("child_process_id_length", info, |info| Ok(info.children().len()))
            .unwrap_or(0)
    }

    pub fn commandline(&self, info: InfoHandle, index: usize) -> String {
        self.with_info("commandline", info, |info| indexed(info.command_line(), index))
            .unwrap_or_default()
    }

    pub fn commandline_length(&self, info: InfoHandle) -> usize {
        self.with_info("commandline_length", info, |info| Ok(info.command_line().len()))
            .unwrap_or(0)
    }

    /// One `NAME=VALUE` entry.
    pub fn environment(&self, info: InfoHandle, index: usize) -> String {
        self.with_info("environment", info, |info| indexed(info.environment(), index))
            .unwrap_or_default()
    }

    pub fn environment_length(&self, info: InfoHandle) -> usize {
        self.with_info("environment_length", info, |info| Ok(info.environment().len()))
            .unwrap_or(0)
    }

    pub fn free_proc_info(&mut self, info: InfoHandle) -> bool {
        if self.infos.remove(info).is_none() {
            warn!("free_proc_info: {} is not allocated", info);
            return false;
        }
        true
    }

    // Direct queries

    pub fn proc_id_from_self(&self) -> ProcId {
        check::proc_id_from_self()
    }

    pub fn parent_proc_id_from_self(&self) -> ProcId {
        check::parent_proc_id_from_self()
    }

    pub fn parent_proc_id_from_proc_id(&self, pid: ProcId) -> ProcId {
        collapse("parent_proc_id_from_proc_id", check::parent_proc_id_from_proc_id(pid))
            .unwrap_or(ProcId::INVALID)
    }

    pub fn executable_from_self(&self) -> String {
        collapse("executable_from_self", check::executable_from_self())
            .map(|path| path_to_string(&path))
            .unwrap_or_default()
    }

    pub fn exe_from_proc_id(&self, pid: ProcId) -> String {
        collapse("exe_from_proc_id", check::exe_from_proc_id(pid))
            .map(|path| path_to_string(&path))
            .unwrap_or_default()
    }

    pub fn cwd_from_proc_id(&self, pid: ProcId) -> String {
        collapse("cwd_from_proc_id", check::cwd_from_proc_id(pid))
            .map(|path| path_to_string(&path))
            .unwrap_or_default()
    }

    // Enumeration

    pub fn proc_list_create(&mut self) -> ListHandle {
        let created = list_all_proc_ids().and_then(|list| self.lists.insert(list));
        collapse("proc_list_create", created).unwrap_or(ListHandle::INVALID)
    }

    pub fn process_id(&self, list: ListHandle, index: usize) -> ProcId {
        let found = self.lists.require(list).and_then(|list| {
            list.get(index).ok_or(Error::IndexOutOfRange {
                index,
                len: list.len(),
            })
        });
        collapse("process_id", found).unwrap_or(ProcId::INVALID)
    }

    pub fn process_id_length(&self, list: ListHandle) -> usize {
        collapse("process_id_length", self.lists.require(list))
            .map(ProcessList::len)
            .unwrap_or(0)
    }

    pub fn free_proc_list(&mut self, list: ListHandle) -> bool {
        if self.lists.remove(list).is_none() {
            warn!("free_proc_list: {} is not allocated", list);
            return false;
        }
        true
    }

    // Environment and directories

    pub fn directory_get_current_working(&self) -> String {
        collapse("directory_get_current_working", self.context.current_dir())
            .map(|path| path_to_string(&path))
            .unwrap_or_default()
    }

    pub fn directory_set_current_working(&mut self, path: &str) -> bool {
        collapse("directory_set_current_working", self.context.set_current_dir(path)).is_some()
    }

    /// Value of `name`; empty when unset.
    pub fn environment_get_variable(&self, name: &str) -> String {
        self.context.var(name).unwrap_or_default()
    }

    pub fn environment_get_variable_exists(&self, name: &str) -> bool {
        self.context.var_exists(name)
    }

    pub fn environment_set_variable(&mut self, name: &str, value: &str) -> bool {
        collapse("environment_set_variable", self.context.set_var(name, value)).is_some()
    }

    pub fn environment_unset_variable(&mut self, name: &str) -> bool {
        collapse("environment_unset_variable", self.context.remove_var(name)).is_some()
    }

    pub fn directory_get_temporary_path(&self) -> String {
        path_to_string(&self.context.temp_dir())
    }
}

#[cfg(feature = "gui-window")]
impl ProcessEngine {
    pub fn owned_window_id(&self, info: InfoHandle, index: usize) -> WindowId {
        self.with_info("owned_window_id", info, |info| indexed(info.owned_windows(), index))
            .unwrap_or_else(|| WindowId::from(String::new()))
    }

    pub fn owned_window_id_length(&self, info: InfoHandle) -> usize {
        self.with_info("owned_window_id_length", info, |info| Ok(info.owned_windows().len()))
            .unwrap_or(0)
    }

    pub fn window_id_exists(&self, window: &WindowId) -> bool {
        window::window_id_exists(window)
    }

    pub fn window_id_suspend(&self, window: &WindowId) -> bool {
        collapse("window_id_suspend", window::window_id_suspend(window)).is_some()
    }

    pub fn window_id_resume(&self, window: &WindowId) -> bool {
        collapse("window_id_resume", window::window_id_resume(window)).is_some()
    }

    pub fn window_id_kill(&self, window: &WindowId) -> bool {
        collapse("window_id_kill", window::window_id_kill(window)).is_some()
    }

    pub fn window_id_from_native_window(&self, handle: usize) -> WindowId {
        window::window_id_from_native_window(handle)
    }

    pub fn proc_id_from_window_id(&self, window: &WindowId) -> ProcId {
        collapse("proc_id_from_window_id", window::proc_id_from_window_id(window))
            .unwrap_or(ProcId::INVALID)
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        // Dropping the runtime cancels the supervisors; with kill_on_drop
        // their children are killed as the tasks go.
        debug!(
            "Shutting down process engine with {} executed processes",
            self.processes.len()
        );
    }
}
