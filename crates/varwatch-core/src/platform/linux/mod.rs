//! # Linux x86-64 Backend
//!
//! - [`ptrace`]: thin safe wrappers over the raw calls
//! - [`launch`]: fork + `PTRACE_TRACEME` + exec with an error pipe
//! - [`process`]: the [`TracedProcess`] session that owns the child

mod launch;
mod process;
pub(crate) mod ptrace;

pub use process::{decode_wait_status, TracedProcess};
