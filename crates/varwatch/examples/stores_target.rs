//! Target that only ever stores to the watched global.
//!
//! Stores 1 through 8 in order and never loads it.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

fn main()
{
    for value in 1..=8u64 {
        WATCHED.store(black_box(value), Ordering::Relaxed);
    }
}
