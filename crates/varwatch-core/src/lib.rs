//! # varwatch-core
//!
//! Symbol resolution, process supervision and hardware watchpoints for varwatch.
//!
//! This crate provides the whole watch pipeline:
//! - Symbol resolution from the on-disk ELF image ([`symbols`])
//! - Word-granularity reads of a traced process ([`memory`])
//! - DR0-DR7 encoding and install/status operations ([`watchpoints`])
//! - Launching the target under ptrace and finding its load base ([`platform`])
//! - The trap dispatch loop that turns stops into read/write events ([`dispatch`])
//!
//! ## Platform Support
//!
//! - **Linux x86-64**: `ptrace` + `/proc/<pid>/maps` + debug registers via the user area
//! - **Everything else**: the resolver, encoders and dispatch loop build and can be
//!   tested, but [`supervisor::watch`] reports that supervision is unavailable
//!
//! ## Why unsafe code is needed
//!
//! `fork`, `execv`, `ptrace` and `waitpid` are raw system calls. They are
//! wrapped in safe functions inside `platform::linux`; nothing outside that
//! module touches `unsafe`.

#![allow(unsafe_code)] // Required for ptrace, fork/exec and waitpid

pub mod dispatch;
pub mod error;
pub mod events;
pub mod maps;
pub mod memory;
pub mod platform;
pub mod prelude;
pub mod supervisor;
pub mod symbols;
pub mod tracee;
pub mod types;
pub mod watchpoints;

pub use dispatch::{TrapDispatcher, WatchSummary, WatchTarget};
pub use error::{ErrorCategory, VarwatchError, VarwatchResult};
pub use events::{AccessKind, WatchEvent};
pub use supervisor::{watch, WatchRequest};
pub use symbols::BinaryImage;
pub use tracee::Tracee;
pub use types::{Address, ProcessId, SymbolDescriptor, WatchWidth};
