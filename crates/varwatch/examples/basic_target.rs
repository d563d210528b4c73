//! Target with a plain read-modify-write loop on one global.
//!
//! Expected under `varwatch --var WATCHED`: one write of 42, then ten
//! read/write pairs counting up to 52.

use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

fn main()
{
    WATCHED.store(42, Ordering::Relaxed);
    for _ in 0..10 {
        let value = WATCHED.load(Ordering::Relaxed);
        WATCHED.store(value + 1, Ordering::Relaxed);
    }
}
