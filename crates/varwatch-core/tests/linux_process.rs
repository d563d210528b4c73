//! Live tracing tests for the Linux backend.
//!
//! These fork real children, so they only build where the backend exists.

#![cfg(all(target_os = "linux", target_arch = "x86_64"))]

use std::path::Path;

use varwatch_core::error::VarwatchError;
use varwatch_core::platform::linux::TracedProcess;
use varwatch_core::prelude::*;

#[test]
fn test_launch_stops_at_exec_and_runs_to_exit()
{
    let mut process = TracedProcess::launch(Path::new("/bin/true"), &[]).unwrap();
    assert!(matches!(process.state(), ProcessState::Stopped(_)));

    let base = process.load_base().unwrap();
    assert_ne!(base, Address::ZERO);

    process.resume(None).unwrap();
    loop {
        match process.wait().unwrap() {
            ProcessState::Terminated(exit) => {
                assert_eq!(exit, ExitInfo::Exited(0));
                break;
            }
            ProcessState::Stopped(StopReason::Signal(signal)) => process.resume(Some(signal)).unwrap(),
            _ => process.resume(None).unwrap(),
        }
    }
}

#[test]
fn test_load_base_maps_elf_header()
{
    let process = TracedProcess::launch(Path::new("/bin/true"), &[]).unwrap();
    let base = process.load_base().unwrap();

    let magic = process.peek_word(base).unwrap().to_ne_bytes();
    assert_eq!(&magic[..4], b"\x7fELF");
}

#[test]
fn test_debug_registers_round_trip()
{
    let mut process = TracedProcess::launch(Path::new("/bin/true"), &[]).unwrap();
    let base = process.load_base().unwrap();

    let plan = WatchpointPlan::new(base, WatchWidth::Qword);
    plan.install(&mut process).unwrap();

    assert_eq!(process.read_debug_register(0).unwrap(), base.value());
    assert_eq!(process.read_debug_register(1).unwrap(), base.value());
    assert_eq!(process.read_debug_register(7).unwrap() & 0xffff_00ff, plan.control());
}

#[test]
fn test_directory_cannot_be_executed()
{
    let result = TracedProcess::launch(Path::new("/"), &[]);
    assert!(matches!(result, Err(VarwatchError::ExecFailed { .. })));
}

#[test]
fn test_missing_executable()
{
    let result = TracedProcess::launch(Path::new("/nonexistent/varwatch-target"), &[]);
    assert!(matches!(result, Err(VarwatchError::ExecFailed { .. })));
}

#[test]
fn test_drop_kills_unfinished_target()
{
    let process = TracedProcess::launch(Path::new("/bin/sleep"), &["30".to_string()]).unwrap();
    let pid = process.pid().raw();
    drop(process);

    let alive = unsafe { libc::kill(pid, 0) } == 0;
    assert!(!alive, "target {pid} survived drop");
}
