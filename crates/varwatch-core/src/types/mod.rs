//! # Types
//!
//! Platform-agnostic types used throughout varwatch.
//!
//! These let the resolver, the watchpoint encoder and the dispatch loop talk
//! about addresses, widths and process states without touching ptrace.

pub mod address;
pub mod process;
pub mod symbols;

// Re-export all public types
pub use address::Address;
pub use process::{ExitInfo, MemoryRegion, ProcessId, ProcessState, StopReason};
pub use symbols::{SymbolDescriptor, WatchWidth};
