//! # Traced Launch
//!
//! Starts the target as a tracee of the current process.
//!
//! ## Protocol
//!
//! 1. Parent creates a pipe with `O_CLOEXEC` on both ends and forks.
//! 2. Child calls `PTRACE_TRACEME`, then `execv`.
//! 3. On success the exec closes the write end and the kernel stops the
//!    child with `SIGTRAP` before its first instruction.
//! 4. On failure the child writes `[stage, errno]` into the pipe and
//!    `_exit(127)`s.
//!
//! The parent reads the pipe to EOF: no bytes means the exec happened.
//!
//! Between `fork` and `execv` the child only makes async-signal-safe calls;
//! every allocation (program path, argv) happens before the fork.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{FromRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use libc::{c_char, c_void, pid_t};
use tracing::{debug, trace};

use crate::error::{VarwatchError, VarwatchResult};

/// Exit status of a child that never reached the target image
const CHILD_FAILURE_STATUS: i32 = 127;

/// Size of the failure report: one stage byte plus a native `i32` errno
const REPORT_LEN: usize = 1 + std::mem::size_of::<i32>();

/// Step at which the child gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ChildStage
{
    /// `PTRACE_TRACEME` failed
    TraceMe = 1,
    /// `execv` failed
    Exec = 2,
}

/// Failure reported by the child over the error pipe
#[derive(Debug)]
pub(crate) struct ChildFailure
{
    pub(crate) stage: ChildStage,
    pub(crate) error: io::Error,
}

impl ChildFailure
{
    /// Decode a report written by [`report_and_exit`].
    fn decode(report: &[u8]) -> Option<Self>
    {
        if report.len() != REPORT_LEN {
            return None;
        }
        let stage = match report[0] {
            1 => ChildStage::TraceMe,
            2 => ChildStage::Exec,
            _ => return None,
        };
        let mut errno = [0u8; 4];
        errno.copy_from_slice(&report[1..]);
        Some(Self {
            stage,
            error: io::Error::from_raw_os_error(i32::from_ne_bytes(errno)),
        })
    }

    /// Turn the report into the error the caller sees
    pub(crate) fn into_error(self, program: &Path) -> VarwatchError
    {
        match self.stage {
            ChildStage::TraceMe => VarwatchError::LaunchFailed(format!("PTRACE_TRACEME failed: {}", self.error)),
            ChildStage::Exec => VarwatchError::ExecFailed {
                path: program.to_path_buf(),
                source: self.error,
            },
        }
    }
}

/// A freshly forked child and the read end of its error pipe
pub(crate) struct SpawnedChild
{
    pub(crate) pid: pid_t,
    pub(crate) error_pipe: File,
}

impl SpawnedChild
{
    /// Block until the child has exec'd or failed.
    ///
    /// `Ok(None)` means the exec succeeded.
    pub(crate) fn read_failure(&mut self) -> VarwatchResult<Option<ChildFailure>>
    {
        let mut report = Vec::with_capacity(REPORT_LEN);
        self.error_pipe
            .read_to_end(&mut report)
            .map_err(|err| VarwatchError::LaunchFailed(format!("failed to read launch status: {err}")))?;

        if report.is_empty() {
            return Ok(None);
        }
        ChildFailure::decode(&report)
            .map(Some)
            .ok_or_else(|| VarwatchError::LaunchFailed(format!("garbled launch status ({} bytes)", report.len())))
    }
}

fn to_cstring(value: &[u8], what: &str) -> VarwatchResult<CString>
{
    CString::new(value).map_err(|e| VarwatchError::InvalidArgument(format!("Invalid {what}: {e}")))
}

/// Fork a child that requests tracing and execs `program`.
///
/// `argv[0]` is `program` exactly as given, followed by `args`.
///
/// ## Errors
///
/// - `InvalidArgument`: empty path, or a NUL byte in the path or an argument
/// - `LaunchFailed`: the pipe or the fork could not be created
pub(crate) fn spawn_traced(program: &Path, args: &[String]) -> VarwatchResult<SpawnedChild>
{
    if program.as_os_str().is_empty() {
        return Err(VarwatchError::InvalidArgument("Program path cannot be empty".to_string()));
    }

    let program_cstr = to_cstring(program.as_os_str().as_bytes(), "program path")?;
    let mut arg_cstrs = vec![program_cstr.clone()];
    for arg in args {
        arg_cstrs.push(to_cstring(arg.as_bytes(), "argument")?);
    }
    let mut argv: Vec<*const c_char> = arg_cstrs.iter().map(|s| s.as_ptr()).collect();
    argv.push(ptr::null());

    let mut fds: [RawFd; 2] = [0; 2];
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
        let err = io::Error::last_os_error();
        return Err(VarwatchError::LaunchFailed(format!("Failed to create error pipe: {err}")));
    }
    let [read_fd, write_fd] = fds;
    trace!(read_fd, write_fd, "Created error pipe");

    match unsafe { libc::fork() } {
        -1 => {
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(read_fd);
                libc::close(write_fd);
            }
            Err(VarwatchError::LaunchFailed(format!("fork failed: {err}")))
        }
        0 => child_exec(&program_cstr, &argv, write_fd),
        pid => {
            unsafe {
                libc::close(write_fd);
            }
            debug!(pid, program = %program.display(), "Forked traced child");
            Ok(SpawnedChild {
                pid,
                error_pipe: unsafe { File::from_raw_fd(read_fd) },
            })
        }
    }
}

/// Child side of the fork. Never returns.
fn child_exec(program: &CString, argv: &[*const c_char], error_fd: RawFd) -> !
{
    unsafe {
        let traced = libc::ptrace(
            libc::PTRACE_TRACEME,
            0,
            ptr::null_mut::<c_void>(),
            ptr::null_mut::<c_void>(),
        );
        if traced == -1 {
            report_and_exit(error_fd, ChildStage::TraceMe);
        }
        libc::execv(program.as_ptr(), argv.as_ptr());
        report_and_exit(error_fd, ChildStage::Exec)
    }
}

/// Write `[stage, errno]` to the pipe and exit without running destructors.
fn report_and_exit(error_fd: RawFd, stage: ChildStage) -> !
{
    unsafe {
        let errno = *libc::__errno_location();
        let mut report = [0u8; REPORT_LEN];
        report[0] = stage as u8;
        report[1..].copy_from_slice(&errno.to_ne_bytes());
        libc::write(error_fd, report.as_ptr().cast::<c_void>(), report.len());
        libc::_exit(CHILD_FAILURE_STATUS)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_exec_failure()
    {
        let mut report = vec![ChildStage::Exec as u8];
        report.extend_from_slice(&libc::ENOENT.to_ne_bytes());

        let failure = ChildFailure::decode(&report).unwrap();
        assert_eq!(failure.stage, ChildStage::Exec);
        assert_eq!(failure.error.raw_os_error(), Some(libc::ENOENT));
        assert!(matches!(
            failure.into_error(Path::new("/missing")),
            VarwatchError::ExecFailed { .. }
        ));
    }

    #[test]
    fn test_decode_traceme_failure()
    {
        let mut report = vec![ChildStage::TraceMe as u8];
        report.extend_from_slice(&libc::EPERM.to_ne_bytes());

        let failure = ChildFailure::decode(&report).unwrap();
        assert!(matches!(failure.into_error(Path::new("/bin/true")), VarwatchError::LaunchFailed(_)));
    }

    #[test]
    fn test_decode_rejects_garbage()
    {
        assert!(ChildFailure::decode(&[2, 0, 0]).is_none());
        assert!(ChildFailure::decode(&[9, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_interior_nul_is_rejected_before_fork()
    {
        let result = spawn_traced(Path::new("/bin/true"), &["a\0b".to_string()]);
        assert!(matches!(result, Err(VarwatchError::InvalidArgument(_))));
        let result = spawn_traced(Path::new(""), &[]);
        assert!(matches!(result, Err(VarwatchError::InvalidArgument(_))));
    }
}
