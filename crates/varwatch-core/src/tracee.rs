//! # Tracee Abstraction
//!
//! The operations the dispatch loop needs from a traced process.
//!
//! The Linux backend implements this on top of `ptrace`/`waitpid`; tests
//! implement it with a scripted sequence of stops. Keeping the loop generic
//! over this trait is what lets it be exercised without a live process.

use crate::error::VarwatchResult;
use crate::memory::WordReader;
use crate::types::{ProcessId, ProcessState};
use crate::watchpoints::DebugRegisterFile;

/// A process under trace control
pub trait Tracee: WordReader + DebugRegisterFile
{
    /// Process ID of the tracee
    fn pid(&self) -> ProcessId;

    /// Block until the next stop or termination.
    ///
    /// Returns `Stopped(_)` or `Terminated(_)`, never `Running`.
    fn wait(&mut self) -> VarwatchResult<ProcessState>;

    /// Resume from a trace stop, delivering `signal` if given.
    fn resume(&mut self, signal: Option<i32>) -> VarwatchResult<()>;
}
