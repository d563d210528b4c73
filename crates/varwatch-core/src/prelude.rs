//! Common module for library exports

pub use crate::dispatch::{TrapDispatcher, WatchSummary, WatchTarget};
pub use crate::error::{VarwatchError, VarwatchResult};
pub use crate::events::{AccessKind, WatchEvent};
pub use crate::memory::WordReader;
pub use crate::symbols::BinaryImage;
pub use crate::tracee::Tracee;
pub use crate::types::{Address, ExitInfo, ProcessId, ProcessState, StopReason, SymbolDescriptor, WatchWidth};
pub use crate::watchpoints::{DebugRegisterFile, TriggerStatus, WatchpointPlan};
