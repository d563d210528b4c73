//! Target that stores its requested exit status and exits with it.
//!
//! `WATCHED` starts at 5 so the first event shows the initial snapshot.

use std::env;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(5);

fn main()
{
    let code: u64 = env::args().nth(1).and_then(|arg| arg.parse().ok()).unwrap_or(0);
    WATCHED.store(code, Ordering::Relaxed);
    process::exit(code as i32);
}
