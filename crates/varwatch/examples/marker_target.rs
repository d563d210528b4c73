//! Target that leaves a file behind when it runs.
//!
//! Used to prove that resolution errors are reported before any process is
//! launched: if the marker exists, the target ran.

use std::env;
use std::fs;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

/// Three bytes: no debug register length covers it
#[no_mangle]
pub static ODD_SIZED: [u8; 3] = [1, 2, 3];

fn main()
{
    if let Some(marker) = env::args().nth(1) {
        fs::write(marker, b"ran\n").expect("write marker");
    }
    black_box(&ODD_SIZED);
    WATCHED.store(1, Ordering::Relaxed);
}
