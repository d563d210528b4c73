//! Target whose signal handler writes the watched global.
//!
//! The supervisor must forward `SIGUSR1`, otherwise the handler never runs
//! and the read at the end sees 1 instead of 99.

#![allow(unsafe_code)] // signal(2) and raise(3)

use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

extern "C" fn on_usr1(_signal: libc::c_int)
{
    WATCHED.store(99, Ordering::Relaxed);
}

fn main()
{
    let handler = on_usr1 as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGUSR1, handler as libc::sighandler_t);
    }

    WATCHED.store(1, Ordering::Relaxed);
    unsafe {
        libc::raise(libc::SIGUSR1);
    }

    let value = WATCHED.load(Ordering::Relaxed);
    std::process::exit(if value == 99 { 0 } else { 1 });
}
