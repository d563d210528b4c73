//! Process, trace-state, and memory region types.

use std::fmt;
use std::path::PathBuf;

use super::Address;

/// Process identifier (PID)
///
/// Stored as the kernel's signed `pid_t` so it can be handed straight to
/// `ptrace`, `waitpid` and `kill` without conversions at every call site.
///
/// ## Example
///
/// ```rust
/// use varwatch_core::types::ProcessId;
///
/// let pid = ProcessId::from(12345);
/// assert_eq!(pid.raw(), 12345);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub i32);

impl ProcessId
{
    /// Get the raw `pid_t` value
    pub fn raw(self) -> i32
    {
        self.0
    }
}

impl From<i32> for ProcessId
{
    fn from(pid: i32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for i32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Why a traced process is halted in a trace stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason
{
    /// Signal-delivery stop
    ///
    /// The `i32` value is the signal number that the kernel is about to
    /// deliver. Resuming with the same number delivers it unmodified; resuming
    /// with none suppresses it.
    Signal(i32),
    /// ptrace event stop (`status >> 16 != 0`), e.g. `PTRACE_EVENT_EXEC`
    ///
    /// These report as `SIGTRAP` but carry no deliverable signal.
    Event(i32),
}

/// How a traced process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitInfo
{
    /// Normal exit with the given status (`WEXITSTATUS`)
    Exited(i32),
    /// Killed by the given signal (`WTERMSIG`)
    Signaled(i32),
}

impl ExitInfo
{
    /// Exit status the supervisor should report for this termination
    ///
    /// A normal exit is passed through unchanged. A signal death maps to
    /// `128 + signal`, the shell convention.
    ///
    /// ```rust
    /// use varwatch_core::types::ExitInfo;
    ///
    /// assert_eq!(ExitInfo::Exited(3).exit_code(), 3);
    /// assert_eq!(ExitInfo::Signaled(9).exit_code(), 137);
    /// ```
    #[must_use]
    pub fn exit_code(self) -> i32
    {
        match self {
            ExitInfo::Exited(code) => code,
            ExitInfo::Signaled(signal) => 128 + signal,
        }
    }
}

impl fmt::Display for ExitInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ExitInfo::Exited(code) => write!(f, "exited with status {code}"),
            ExitInfo::Signaled(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}

/// Trace state of the supervised process
///
/// ## State Transitions
///
/// - `Running` → `Stopped(reason)`: `waitpid` reported a trace stop
/// - `Running` → `Terminated(info)`: `waitpid` reported exit or signal death
/// - `Stopped(_)` → `Running`: the supervisor resumed the process
///
/// `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState
{
    /// Executing (or at least not known to be stopped)
    Running,
    /// Halted in a trace stop until explicitly resumed
    Stopped(StopReason),
    /// Gone; nothing more can be done with it
    Terminated(ExitInfo),
}

impl ProcessState
{
    /// Whether the process has reached its final state
    pub fn is_terminated(self) -> bool
    {
        matches!(self, ProcessState::Terminated(_))
    }
}

/// Mapped memory region of a process
///
/// Built from one entry of `/proc/<pid>/maps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// Start address (inclusive)
    pub start: Address,

    /// End address (exclusive)
    pub end: Address,

    /// Backing path, pseudo-name (`[heap]`, `[stack]`) or `None` for anonymous memory
    pub path: Option<PathBuf>,
}

impl MemoryRegion
{
    /// Create a new memory region
    pub fn new(start: Address, end: Address, path: Option<PathBuf>) -> Self
    {
        Self { start, end, path }
    }
}
