//! End-to-end scenarios for the process engine.
//!
//! These launch real shell commands, so they only run on Unix.

#![cfg(unix)]

use procctl::{Handle, InfoFlags, ProcId, ProcessEngine, ProcessHandle};
use serial_test::serial;
use std::time::{Duration, Instant};

fn engine() -> ProcessEngine {
    ProcessEngine::with_defaults().expect("engine should start")
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}

#[test]
fn test_execute_captures_output() {
    let mut engine = engine();
    let run = engine.execute("echo hello");

    assert!(run.handle.is_valid());
    assert!(run.proc_id.is_valid());
    assert_eq!(run.exit_code, Some(0));
    assert!(engine.completion_status(run.handle));
    assert!(engine.read_from_standard_output(run.handle).contains("hello"));
}

#[test]
fn test_execute_reports_exit_code() {
    let mut engine = engine();

    assert_eq!(engine.execute("exit 7").exit_code, Some(7));
    assert_eq!(engine.execute("definitely-not-a-command-procctl").exit_code, Some(127));
}

#[test]
fn test_async_completion_is_eventually_true() {
    let mut engine = engine();
    let handle = engine.execute_async("sleep 1");

    assert!(handle.is_valid());
    assert!(!engine.completion_status(handle));

    assert!(wait_until(Duration::from_secs(10), || engine.completion_status(handle)));
    assert!(engine.completion_status(handle));
    assert_eq!(engine.exit_code(handle), Some(0));
}

#[test]
fn test_stdin_echo_round_trip() {
    let mut engine = engine();
    let handle = engine.execute_async("cat");

    assert_eq!(engine.write_to_standard_input(handle, "ping\n"), 5);
    assert!(wait_until(Duration::from_secs(5), || {
        engine.read_from_standard_output(handle) == "ping\n"
    }));

    // Reading again returns the same retained output
    assert_eq!(engine.read_from_standard_output(handle), "ping\n");

    assert!(engine.free_standard_input(handle));
    assert!(!engine.free_standard_input(handle));
    assert_eq!(engine.write_to_standard_input(handle, "late\n"), 0);
    assert!(wait_until(Duration::from_secs(5), || engine.completion_status(handle)));

    // Completed with stdin released: freeing output releases the handle
    assert!(engine.free_standard_output(handle));
    assert!(engine.completion(handle).is_none());
    assert!(!engine.free_standard_output(handle));
}

#[test]
fn test_free_output_keeps_running_child() {
    let mut engine = engine();
    let handle = engine.execute_async("echo first; cat");

    assert!(wait_until(Duration::from_secs(5), || {
        engine.read_from_standard_output(handle) == "first\n"
    }));
    assert!(engine.free_standard_output(handle));
    assert_eq!(engine.read_from_standard_output(handle), "");

    // Still registered while the child runs
    assert!(engine.completion(handle).is_some());
    engine.write_to_standard_input(handle, "second\n");
    assert!(wait_until(Duration::from_secs(5), || {
        engine.read_from_standard_output(handle) == "second\n"
    }));

    assert!(engine.free_standard_input(handle));
}

#[test]
fn test_buffer_limit_drops_oldest_bytes() {
    let mut engine = engine();

    engine.set_buffer_limit(4);
    let run = engine.execute("printf 0123456789");
    assert_eq!(engine.read_from_standard_output(run.handle), "6789");

    engine.set_buffer_limit(0);
    let run = engine.execute("printf 0123456789");
    assert_eq!(engine.read_from_standard_output(run.handle), "");
}

#[test]
fn test_control_of_missing_process() {
    let engine = engine();
    let missing = ProcId::from_raw(i32::MAX as u32);

    assert!(!engine.proc_id_exists(missing));
    assert!(!engine.proc_id_suspend(missing));
    assert!(!engine.proc_id_resume(missing));
    assert!(!engine.proc_id_kill(missing));
    assert!(!engine.proc_id_exists(ProcId::INVALID));
}

#[test]
fn test_suspend_resume_kill_async_child() {
    let mut engine = engine();
    let handle = engine.execute_async("exec sleep 30");
    let pid = engine.proc_id_from_handle(handle);

    assert!(engine.proc_id_exists(pid));
    for _ in 0..5 {
        assert!(engine.proc_id_suspend(pid));
        assert!(!engine.proc_id_suspend(pid));
        assert!(engine.proc_id_is_suspended(pid));

        assert!(engine.proc_id_resume(pid));
        assert!(!engine.proc_id_resume(pid));
        assert!(!engine.proc_id_is_suspended(pid));
    }

    assert!(engine.proc_id_kill(pid));
    assert!(wait_until(Duration::from_secs(5), || engine.completion_status(handle)));
    assert_eq!(engine.exit_code(handle), None);
    assert!(!engine.proc_id_exists(pid));
    assert!(!engine.proc_id_kill(pid));
}

#[cfg(target_os = "linux")]
#[test]
fn test_thread_id_is_not_a_process() {
    let mut engine = engine();
    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
    let worker = std::thread::spawn(move || {
        let _ = stop_rx.recv();
    });

    let me = engine.proc_id_from_self();
    let tid = std::fs::read_dir("/proc/self/task")
        .unwrap()
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<u32>().ok())
        .map(ProcId::from_raw)
        .find(|tid| *tid != me)
        .expect("a second thread");

    assert!(!engine.proc_id_exists(tid));
    assert!(!engine.proc_id_kill(tid));
    assert!(!engine.proc_id_suspend(tid));
    assert!(!engine.proc_info_from_proc_id(tid).is_valid());

    let list = engine.proc_list_create();
    let len = engine.process_id_length(list);
    assert!((0..len).all(|i| engine.process_id(list, i) != tid));
    engine.free_proc_list(list);

    stop_tx.send(()).unwrap();
    worker.join().unwrap();
}

#[test]
fn test_list_contains_self() {
    let mut engine = engine();
    let list = engine.proc_list_create();
    let me = engine.proc_id_from_self();

    let len = engine.process_id_length(list);
    assert!((0..len).any(|i| engine.process_id(list, i) == me));
    assert!(engine.free_proc_list(list));
}

#[test]
fn test_info_reports_children() {
    let mut engine = engine();
    let handle = engine.execute_async("sleep 5 & sleep 5 & wait");
    let shell = engine.proc_id_from_handle(handle);

    let mut children = Vec::new();
    assert!(wait_until(Duration::from_secs(5), || {
        let info = engine.proc_info_from_proc_id_ex(shell, InfoFlags::CHILD_PROC_IDS);
        children = (0..engine.child_process_id_length(info))
            .map(|i| engine.child_process_id(info, i))
            .collect();
        engine.free_proc_info(info);
        children.len() == 2
    }));

    for child in &children {
        assert_eq!(engine.parent_proc_id_from_proc_id(*child), shell);
        assert!(engine.proc_id_kill(*child));
    }
    assert!(wait_until(Duration::from_secs(5), || engine.completion_status(handle)));
}

#[test]
fn test_info_of_self() {
    let mut engine = engine();
    let me = engine.proc_id_from_self();
    let info = engine.proc_info_from_proc_id(me);

    assert_eq!(engine.executable_image_file_path(info), engine.executable_from_self());
    assert_eq!(engine.parent_process_id(info), engine.parent_proc_id_from_self());
    assert!(engine.commandline_length(info) > 0);
    assert!(!engine.commandline(info, 0).is_empty());
    assert_eq!(engine.commandline(info, engine.commandline_length(info)), "");
    assert!((0..engine.environment_length(info)).all(|i| engine.environment(info, i).contains('=')));

    assert!(engine.free_proc_info(info));
    assert_eq!(engine.commandline_length(info), 0);
    assert!(!engine.free_proc_info(info));
}

#[test]
#[serial]
fn test_environment_round_trip_and_inheritance() {
    let mut engine = engine();
    let name = "PROCCTL_SCENARIO_VAR";

    assert!(engine.environment_set_variable(name, "inherited"));
    assert!(engine.environment_get_variable_exists(name));
    assert_eq!(engine.environment_get_variable(name), "inherited");

    let run = engine.execute(&format!("echo ${}", name));
    assert_eq!(engine.read_from_standard_output(run.handle), "inherited\n");

    assert!(engine.environment_unset_variable(name));
    assert!(!engine.environment_get_variable_exists(name));
    assert_eq!(engine.environment_get_variable(name), "");

    assert!(!engine.environment_set_variable("BAD=NAME", "x"));
}

#[test]
#[serial]
fn test_working_directory_is_inherited() {
    let mut engine = engine();
    let original = engine.directory_get_current_working();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();

    assert!(engine.directory_set_current_working(target.to_str().unwrap()));
    let run = engine.execute("pwd -P");
    assert_eq!(
        engine.read_from_standard_output(run.handle).trim_end(),
        target.to_str().unwrap()
    );

    assert!(!engine.directory_set_current_working("/definitely/not/a/dir"));
    assert!(engine.directory_set_current_working(&original));
    assert!(!engine.directory_get_temporary_path().is_empty());
}

#[test]
fn test_handles_cross_boundary_as_f64() {
    let mut engine = engine();
    let run = engine.execute("true");

    let raw = run.handle.to_f64();
    let back = ProcessHandle::from_f64(raw).unwrap();
    assert_eq!(back, run.handle);
    assert!(engine.completion_status(back));

    let pid = ProcId::from_f64(run.proc_id.to_f64()).unwrap();
    assert_eq!(pid, run.proc_id);
}

#[test]
fn test_drop_kills_async_children() {
    let mut engine = engine();
    let handle = engine.execute_async("exec sleep 30");
    let pid = engine.proc_id_from_handle(handle);
    assert!(engine.proc_id_exists(pid));

    drop(engine);

    let probe = ProcessEngine::with_defaults().unwrap();
    assert!(wait_until(Duration::from_secs(5), || !probe.proc_id_exists(pid)));
}
