//! # Error Types
//!
//! General error handling for varwatch.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Address;

/// Main error type for varwatch operations
///
/// Every variant is fatal: there is no retry anywhere in the pipeline, so the
/// variants exist to give the user an informative message and the binary a
/// distinct exit code.
///
/// ## Error Categories
///
/// 1. **Resolution errors**: ReadBinary, NotAnExecutable, UnsupportedFormat,
///    MalformedBinary, SymbolNotFound, UndefinedSymbol, UnsupportedWatchWidth
/// 2. **Launch errors**: InvalidArgument, LaunchFailed, ExecFailed,
///    UnexpectedInitialStop, BaseAddressNotFound
/// 3. **Runtime control errors**: AddressOutOfRange, MemoryAccessFailed,
///    DebugRegisterAccess, TraceControl, Io
#[derive(Error, Debug)]
pub enum VarwatchError
{
    /// The binary could not be read from disk
    #[error("failed to read {}: {source}", path.display())]
    ReadBinary
    {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The file is too small for an ELF header or does not start with the ELF magic
    #[error("not an executable: {0}")]
    NotAnExecutable(String),

    /// The file is ELF, but not a flavour we can handle (e.g. 32-bit)
    #[error("unsupported binary format: {0}")]
    UnsupportedFormat(String),

    /// A header, section or symbol table points outside the file
    ///
    /// Header fields come straight from a user-supplied file, so every offset
    /// and count is checked before it is used. This is what a failed check
    /// turns into.
    #[error("malformed binary: {0}")]
    MalformedBinary(String),

    /// No `.symtab` / `.dynsym` entry carries this exact name
    #[error("symbol '{name}' not found in {}", path.display())]
    SymbolNotFound
    {
        /// Requested symbol name
        name: String,
        /// Binary that was searched
        path: PathBuf,
    },

    /// The symbol exists but is undefined (`SHN_UNDEF`) in this binary
    #[error("symbol '{name}' is undefined")]
    UndefinedSymbol
    {
        /// Requested symbol name
        name: String,
    },

    /// The symbol size is not a width the debug registers can watch (1, 2, 4 or 8)
    #[error("unsupported symbol size {0} (must be 1, 2, 4 or 8 bytes)")]
    UnsupportedWatchWidth(u64),

    /// Invalid argument passed to a varwatch function
    ///
    /// Examples:
    /// - An executable path or argument containing an interior NUL byte
    /// - An empty executable path
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Creating the child process failed before it could exec
    #[error("failed to launch target: {0}")]
    LaunchFailed(String),

    /// The child could not request tracing or replace its image
    #[error("failed to exec {}: {source}", path.display())]
    ExecFailed
    {
        /// Executable that was being launched
        path: PathBuf,
        /// OS error reported by the child
        source: io::Error,
    },

    /// The first wait after launch did not observe the post-exec `SIGTRAP`
    #[error("target did not stop after exec: {0}")]
    UnexpectedInitialStop(String),

    /// No mapping in `/proc/<pid>/maps` is backed by the launched executable
    #[error("failed to determine base address of {} via /proc/{pid}/maps", path.display())]
    BaseAddressNotFound
    {
        /// Traced process
        pid: i32,
        /// Executable path that was matched against the mappings
        path: PathBuf,
    },

    /// Load base plus symbol offset does not fit in the address space
    #[error("watch address out of range: base {base} + offset 0x{offset:x}")]
    AddressOutOfRange
    {
        /// Load bias of the image
        base: Address,
        /// Link-time address of the symbol
        offset: u64,
    },

    /// `PTRACE_PEEKDATA` failed
    #[error("failed to read tracee memory at {address}: {source}")]
    MemoryAccessFailed
    {
        /// Word address that was being read
        address: Address,
        /// Underlying OS error
        source: io::Error,
    },

    /// `PTRACE_PEEKUSER` / `PTRACE_POKEUSER` on a debug register failed
    #[error("failed to access debug register DR{index}: {source}")]
    DebugRegisterAccess
    {
        /// Debug register number (0-7)
        index: usize,
        /// Underlying OS error
        source: io::Error,
    },

    /// A wait/resume/option call on the traced process failed
    #[error("{operation} failed: {source}")]
    TraceControl
    {
        /// Name of the failed operation (e.g. `PTRACE_CONT`)
        operation: &'static str,
        /// Underlying OS error
        source: io::Error,
    },

    /// Writing an event line to the output stream failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse grouping of [`VarwatchError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory
{
    /// Raised while reading the binary, before any process exists
    Resolution,
    /// Raised while creating the traced process
    Launch,
    /// Raised while talking to a live traced process
    Runtime,
}

impl VarwatchError
{
    /// Which stage of the pipeline produced this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory
    {
        match self {
            Self::ReadBinary { .. }
            | Self::NotAnExecutable(_)
            | Self::UnsupportedFormat(_)
            | Self::MalformedBinary(_)
            | Self::SymbolNotFound { .. }
            | Self::UndefinedSymbol { .. }
            | Self::UnsupportedWatchWidth(_) => ErrorCategory::Resolution,
            Self::InvalidArgument(_)
            | Self::LaunchFailed(_)
            | Self::ExecFailed { .. }
            | Self::UnexpectedInitialStop(_)
            | Self::BaseAddressNotFound { .. } => ErrorCategory::Launch,
            Self::AddressOutOfRange { .. }
            | Self::MemoryAccessFailed { .. }
            | Self::DebugRegisterAccess { .. }
            | Self::TraceControl { .. }
            | Self::Io(_) => ErrorCategory::Runtime,
        }
    }
}

/// Convenience type alias for `Result<T, VarwatchError>`
///
/// ```rust
/// use varwatch_core::error::VarwatchResult;
/// fn foo() -> VarwatchResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type VarwatchResult<T> = std::result::Result<T, VarwatchError>;
