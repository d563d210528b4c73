//! # Trap Dispatch
//!
//! The loop that runs after the watchpoints are armed: wait for the tracee to
//! stop, decide whether the stop belongs to us, report it, and resume.
//!
//! ## Stop handling
//!
//! | Stop                                  | Action                                   |
//! |---------------------------------------|------------------------------------------|
//! | exit / signal death                   | return the [`WatchSummary`]              |
//! | ptrace event stop                     | resume, no signal                        |
//! | `SIGTRAP`, DR6 shows B0 or B1         | emit event, clear DR6, resume, no signal |
//! | `SIGTRAP`, neither bit set            | resume delivering `SIGTRAP`              |
//! | any other signal                      | resume delivering that signal            |
//!
//! The previous value printed for a write is the value cached from the last
//! write (or the snapshot taken before the target started), so consecutive
//! writes chain: one event's current is the next event's previous.

use std::io::Write;

use tracing::{debug, info, trace};

use crate::error::VarwatchResult;
use crate::events::{write_event, AccessKind, WatchEvent};
use crate::memory::read_value;
use crate::tracee::Tracee;
use crate::types::{Address, ExitInfo, ProcessState, StopReason, WatchWidth};
use crate::watchpoints::{clear_trigger_state, read_trigger_state};

/// The variable being watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget
{
    /// Name used in event lines
    pub symbol: String,
    /// Runtime address in the tracee
    pub address: Address,
    /// Size of the variable
    pub width: WatchWidth,
}

/// Outcome of a completed watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary
{
    /// How the target ended
    pub exit: ExitInfo,
    /// Number of read events emitted
    pub reads: u64,
    /// Number of write events emitted
    pub writes: u64,
}

/// Drives a stopped, armed tracee until it terminates.
pub struct TrapDispatcher<'a, T: Tracee + ?Sized, W: Write + ?Sized>
{
    tracee: &'a mut T,
    target: WatchTarget,
    last_value: u64,
    out: &'a mut W,
    reads: u64,
    writes: u64,
}

impl<'a, T: Tracee + ?Sized, W: Write + ?Sized> TrapDispatcher<'a, T, W>
{
    /// `initial_value` is the value the variable held before the tracee was
    /// resumed; it is the "previous" of the first write.
    pub fn new(tracee: &'a mut T, target: WatchTarget, initial_value: u64, out: &'a mut W) -> Self
    {
        Self {
            tracee,
            target,
            last_value: initial_value,
            out,
            reads: 0,
            writes: 0,
        }
    }

    /// Run until the tracee exits or is killed.
    ///
    /// The tracee must be stopped-and-resumed already, i.e. the next thing
    /// to do is wait for it.
    ///
    /// ## Errors
    ///
    /// Any failed wait, resume, register access, memory read or output write
    /// aborts the loop.
    pub fn run(mut self) -> VarwatchResult<WatchSummary>
    {
        loop {
            match self.tracee.wait()? {
                ProcessState::Terminated(exit) => {
                    info!(
                        pid = %self.tracee.pid(),
                        %exit,
                        reads = self.reads,
                        writes = self.writes,
                        "Target terminated"
                    );
                    return Ok(WatchSummary {
                        exit,
                        reads: self.reads,
                        writes: self.writes,
                    });
                }
                ProcessState::Stopped(StopReason::Event(event)) => {
                    trace!(event, "Resuming from ptrace event stop");
                    self.tracee.resume(None)?;
                }
                ProcessState::Stopped(StopReason::Signal(libc::SIGTRAP)) => {
                    let forward = self.handle_trap()?;
                    self.tracee.resume(forward)?;
                }
                ProcessState::Stopped(StopReason::Signal(signal)) => {
                    debug!(signal, "Forwarding signal to target");
                    self.tracee.resume(Some(signal))?;
                }
                ProcessState::Running => {}
            }
        }
    }

    /// Consume a watchpoint trap, or hand back `SIGTRAP` if it wasn't ours.
    fn handle_trap(&mut self) -> VarwatchResult<Option<i32>>
    {
        let status = read_trigger_state(&*self.tracee)?;
        let Some(kind) = status.classify() else {
            debug!(dr6 = format_args!("0x{:x}", status.0), "SIGTRAP not caused by a watchpoint");
            return Ok(Some(libc::SIGTRAP));
        };

        let value = read_value(&*self.tracee, self.target.address, self.target.width)?;
        let event = match kind {
            AccessKind::Read => {
                self.reads += 1;
                WatchEvent::Read { value }
            }
            AccessKind::Write => {
                self.writes += 1;
                let previous = self.last_value;
                self.last_value = value;
                WatchEvent::Write {
                    previous,
                    current: value,
                }
            }
        };

        write_event(&mut *self.out, &self.target.symbol, &event)?;
        clear_trigger_state(&mut *self.tracee)?;
        Ok(None)
    }
}
