//! Safe wrappers around the `ptrace`, `waitpid` and `kill` system calls.
//!
//! Each wrapper returns the raw OS error; callers attach context.

use std::io;
use std::mem::{self, offset_of};
use std::ptr;

use libc::{c_int, c_void, pid_t};

/// Byte offset of debug register `index` inside `struct user`.
///
/// `PTRACE_PEEKUSER` / `PTRACE_POKEUSER` address the user area by offset;
/// the eight debug registers live in the `u_debugreg` array.
pub(crate) fn debug_register_offset(index: usize) -> usize
{
    offset_of!(libc::user, u_debugreg) + index * mem::size_of::<u64>()
}

/// Run a peek-style request, which returns data in-band.
///
/// `-1` is a valid word, so errno has to be cleared first and checked after.
fn peek(request: libc::c_uint, pid: pid_t, address: usize) -> io::Result<u64>
{
    unsafe {
        *libc::__errno_location() = 0;
        let word = libc::ptrace(request, pid, address as *mut c_void, ptr::null_mut::<c_void>());
        if word == -1 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(0) {
                return Err(err);
            }
        }
        Ok(word as u64)
    }
}

fn check(result: libc::c_long) -> io::Result<()>
{
    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// `PTRACE_PEEKDATA`: one word of tracee memory
pub(crate) fn peek_data(pid: pid_t, address: u64) -> io::Result<u64>
{
    peek(libc::PTRACE_PEEKDATA, pid, address as usize)
}

/// `PTRACE_PEEKUSER`: one word of the user area
pub(crate) fn peek_user(pid: pid_t, offset: usize) -> io::Result<u64>
{
    peek(libc::PTRACE_PEEKUSER, pid, offset)
}

/// `PTRACE_POKEUSER`: store one word into the user area
pub(crate) fn poke_user(pid: pid_t, offset: usize, value: u64) -> io::Result<()>
{
    check(unsafe { libc::ptrace(libc::PTRACE_POKEUSER, pid, offset as *mut c_void, value as usize as *mut c_void) })
}

/// `PTRACE_CONT`, optionally injecting `signal`
pub(crate) fn cont(pid: pid_t, signal: Option<i32>) -> io::Result<()>
{
    let signal = signal.unwrap_or(0) as usize;
    check(unsafe { libc::ptrace(libc::PTRACE_CONT, pid, ptr::null_mut::<c_void>(), signal as *mut c_void) })
}

/// `PTRACE_SETOPTIONS`
pub(crate) fn set_options(pid: pid_t, options: c_int) -> io::Result<()>
{
    check(unsafe {
        libc::ptrace(
            libc::PTRACE_SETOPTIONS,
            pid,
            ptr::null_mut::<c_void>(),
            options as usize as *mut c_void,
        )
    })
}

/// Blocking `waitpid`, retried on `EINTR`. Returns the raw status word.
pub(crate) fn wait_pid(pid: pid_t) -> io::Result<c_int>
{
    loop {
        let mut status: c_int = 0;
        if unsafe { libc::waitpid(pid, &mut status, 0) } != -1 {
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Send `signal` to `pid`
pub(crate) fn kill(pid: pid_t, signal: c_int) -> io::Result<()>
{
    if unsafe { libc::kill(pid, signal) } == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
