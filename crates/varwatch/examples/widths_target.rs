//! Target with one watched global of each supported width.
//!
//! Each variable sees: write 0 -> 1, read 1, write 1 -> 2.

use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

#[no_mangle]
pub static WATCHED_U8: AtomicU8 = AtomicU8::new(0);
#[no_mangle]
pub static WATCHED_U16: AtomicU16 = AtomicU16::new(0);
#[no_mangle]
pub static WATCHED_U32: AtomicU32 = AtomicU32::new(0);
#[no_mangle]
pub static WATCHED_U64: AtomicU64 = AtomicU64::new(0);

macro_rules! touch {
    ($var:ident) => {
        $var.store(1, Ordering::Relaxed);
        let value = $var.load(Ordering::Relaxed);
        $var.store(value + 1, Ordering::Relaxed);
    };
}

fn main()
{
    touch!(WATCHED_U8);
    touch!(WATCHED_U16);
    touch!(WATCHED_U32);
    touch!(WATCHED_U64);
}
