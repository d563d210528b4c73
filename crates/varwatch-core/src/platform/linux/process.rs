//! # Traced Process Session
//!
//! [`TracedProcess`] owns a child launched under `ptrace` for the whole
//! watch session.
//!
//! ## Lifecycle
//!
//! ```text
//! launch ──► stopped at exec (SIGTRAP) ──► resume ⇄ wait ──► terminated
//! ```
//!
//! Dropping a session whose child has not terminated sends `SIGKILL` and
//! reaps it, so an error anywhere in the supervisor never leaves a stopped
//! tracee behind. `PTRACE_O_EXITKILL` covers the case where the supervisor
//! itself dies.

use std::fs;
use std::path::{Path, PathBuf};

use libc::c_int;
use tracing::{debug, info, trace, warn};

use super::launch::spawn_traced;
use super::ptrace;
use crate::error::{VarwatchError, VarwatchResult};
use crate::maps::{find_load_base, read_regions};
use crate::memory::WordReader;
use crate::tracee::Tracee;
use crate::types::{Address, ExitInfo, ProcessId, ProcessState, StopReason};
use crate::watchpoints::DebugRegisterFile;

/// Translate a raw `waitpid` status word.
///
/// A stop whose high bits carry a ptrace event number (`status >> 16`) is an
/// event stop, not a signal-delivery stop, even though it reports `SIGTRAP`.
pub fn decode_wait_status(status: c_int) -> ProcessState
{
    if libc::WIFEXITED(status) {
        ProcessState::Terminated(ExitInfo::Exited(libc::WEXITSTATUS(status)))
    } else if libc::WIFSIGNALED(status) {
        ProcessState::Terminated(ExitInfo::Signaled(libc::WTERMSIG(status)))
    } else if libc::WIFSTOPPED(status) {
        match status >> 16 {
            0 => ProcessState::Stopped(StopReason::Signal(libc::WSTOPSIG(status))),
            event => ProcessState::Stopped(StopReason::Event(event)),
        }
    } else {
        ProcessState::Running
    }
}

/// A child process traced by this process
#[derive(Debug)]
pub struct TracedProcess
{
    pid: ProcessId,
    executable: PathBuf,
    state: ProcessState,
}

impl TracedProcess
{
    /// Launch `executable` with `args` and stop it right after exec.
    ///
    /// On success the child is in a trace stop before running any of its own
    /// code, with `PTRACE_O_EXITKILL | PTRACE_O_TRACEEXEC` set.
    ///
    /// ## Errors
    ///
    /// - `ExecFailed`: the path does not exist, is not executable, or the
    ///   kernel refused to run it
    /// - `InvalidArgument` / `LaunchFailed`: see the launch module
    /// - `UnexpectedInitialStop`: the child did not stop with `SIGTRAP`
    /// - `TraceControl`: waiting or setting options failed
    pub fn launch(executable: &Path, args: &[String]) -> VarwatchResult<Self>
    {
        let canonical = fs::canonicalize(executable).map_err(|source| VarwatchError::ExecFailed {
            path: executable.to_path_buf(),
            source,
        })?;

        let mut child = spawn_traced(executable, args)?;
        let mut process = Self {
            pid: ProcessId(child.pid),
            executable: canonical,
            state: ProcessState::Running,
        };

        if let Some(failure) = child.read_failure()? {
            // The child has already `_exit`ed; collect it before reporting.
            let state = process.wait()?;
            debug!(pid = %process.pid, ?state, "Launch failed in child");
            return Err(failure.into_error(executable));
        }

        match process.wait()? {
            ProcessState::Stopped(StopReason::Signal(libc::SIGTRAP)) => {}
            other => {
                return Err(VarwatchError::UnexpectedInitialStop(format!("{other:?}")));
            }
        }

        ptrace::set_options(process.pid.raw(), libc::PTRACE_O_EXITKILL | libc::PTRACE_O_TRACEEXEC).map_err(
            |source| VarwatchError::TraceControl {
                operation: "PTRACE_SETOPTIONS",
                source,
            },
        )?;

        info!(
            pid = %process.pid,
            executable = %process.executable.display(),
            "Target stopped at exec"
        );
        Ok(process)
    }

    /// Last observed state
    pub fn state(&self) -> ProcessState
    {
        self.state
    }

    /// Address where the kernel mapped the executable.
    ///
    /// The lowest mapping in `/proc/<pid>/maps` whose path equals the
    /// canonical executable path.
    pub fn load_base(&self) -> VarwatchResult<Address>
    {
        let not_found = || VarwatchError::BaseAddressNotFound {
            pid: self.pid.raw(),
            path: self.executable.clone(),
        };

        let regions = read_regions(self.pid).map_err(|err| {
            warn!(pid = %self.pid, error = %err, "Failed to read memory map");
            not_found()
        })?;
        trace!(pid = %self.pid, regions = regions.len(), "Read memory map");

        let region = find_load_base(&regions, &self.executable).ok_or_else(not_found)?;
        let base = region.start;
        debug!(pid = %self.pid, %base, end = %region.end, "Found load base");
        Ok(base)
    }

    fn ensure_stopped(&self, operation: &str) -> VarwatchResult<()>
    {
        if self.state.is_terminated() {
            return Err(VarwatchError::InvalidArgument(format!(
                "cannot {operation}: process {} has terminated",
                self.pid
            )));
        }
        Ok(())
    }
}

impl WordReader for TracedProcess
{
    fn peek_word(&self, address: Address) -> VarwatchResult<u64>
    {
        ptrace::peek_data(self.pid.raw(), address.value())
            .map_err(|source| VarwatchError::MemoryAccessFailed { address, source })
    }
}

impl DebugRegisterFile for TracedProcess
{
    fn read_debug_register(&self, index: usize) -> VarwatchResult<u64>
    {
        ptrace::peek_user(self.pid.raw(), ptrace::debug_register_offset(index))
            .map_err(|source| VarwatchError::DebugRegisterAccess { index, source })
    }

    fn write_debug_register(&mut self, index: usize, value: u64) -> VarwatchResult<()>
    {
        trace!(pid = %self.pid, index, value = format_args!("0x{value:x}"), "Writing debug register");
        ptrace::poke_user(self.pid.raw(), ptrace::debug_register_offset(index), value)
            .map_err(|source| VarwatchError::DebugRegisterAccess { index, source })
    }
}

impl Tracee for TracedProcess
{
    fn pid(&self) -> ProcessId
    {
        self.pid
    }

    fn wait(&mut self) -> VarwatchResult<ProcessState>
    {
        if self.state.is_terminated() {
            return Ok(self.state);
        }
        let status = ptrace::wait_pid(self.pid.raw()).map_err(|source| VarwatchError::TraceControl {
            operation: "waitpid",
            source,
        })?;
        self.state = decode_wait_status(status);
        trace!(pid = %self.pid, status = format_args!("0x{status:x}"), state = ?self.state, "Wait returned");
        Ok(self.state)
    }

    fn resume(&mut self, signal: Option<i32>) -> VarwatchResult<()>
    {
        self.ensure_stopped("resume")?;
        ptrace::cont(self.pid.raw(), signal).map_err(|source| VarwatchError::TraceControl {
            operation: "PTRACE_CONT",
            source,
        })?;
        self.state = ProcessState::Running;
        Ok(())
    }
}

impl Drop for TracedProcess
{
    fn drop(&mut self)
    {
        if self.state.is_terminated() {
            return;
        }

        debug!(pid = %self.pid, "Killing unfinished target");
        if let Err(err) = ptrace::kill(self.pid.raw(), libc::SIGKILL) {
            warn!(pid = %self.pid, error = %err, "Failed to kill target");
        }
        while !self.state.is_terminated() {
            match ptrace::wait_pid(self.pid.raw()) {
                Ok(status) => self.state = decode_wait_status(status),
                Err(err) => {
                    warn!(pid = %self.pid, error = %err, "Failed to reap target");
                    break;
                }
            }
        }
    }
}
