//! Target that writes the watched global on the way down one recursion and
//! reads it back on the way down a second.
//!
//! `writes(20)` stores 20, 19, ..., 0 from successive frames, then
//! `reads(20)` loads the final 0 from 21 frames.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

const DEPTH: u64 = 20;

#[inline(never)]
fn writes(n: u64)
{
    WATCHED.store(n, Ordering::Relaxed);
    if n > 0 {
        writes(black_box(n - 1));
    }
}

#[inline(never)]
fn reads(n: u64)
{
    black_box(WATCHED.load(Ordering::Relaxed));
    if n > 0 {
        reads(black_box(n - 1));
    }
}

fn main()
{
    writes(black_box(DEPTH));
    reads(black_box(DEPTH));
}
