//! Target that checks it received its arguments verbatim.
//!
//! Stores the argument count (excluding argv[0]) in `WATCHED`. Exits 1 if
//! the arguments differ from the expected list, so a mangled command line
//! shows up in the exit status.

use std::env;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

#[no_mangle]
pub static WATCHED: AtomicU64 = AtomicU64::new(0);

const EXPECTED: [&str; 3] = ["alpha", "two words", "--flag"];

fn main()
{
    let args: Vec<String> = env::args().collect();
    WATCHED.store((args.len() - 1) as u64, Ordering::Relaxed);

    let program_ok = args.first().is_some_and(|arg0| arg0.ends_with("args_target"));
    if !program_ok || args[1..] != EXPECTED {
        eprintln!("unexpected argv: {args:?}");
        process::exit(1);
    }
}
