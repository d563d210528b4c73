//! Watch event types and their line format.
//!
//! Each trap on the watched variable becomes one [`WatchEvent`], printed as a
//! single tab-separated line:
//!
//! ```text
//! <symbol>\tread\t<value>
//! <symbol>\twrite\t<previous> -> <current>
//! ```
//!
//! Values are unsigned decimal. Event lines are the only thing varwatch
//! writes to stdout; diagnostics go to the log on stderr.

use std::fmt;
use std::io::Write;

use crate::error::VarwatchResult;

/// What the traced program did to the variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind
{
    /// Load without store
    Read,
    /// Store (possibly of an unchanged value)
    Write,
}

impl fmt::Display for AccessKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            AccessKind::Read => f.write_str("read"),
            AccessKind::Write => f.write_str("write"),
        }
    }
}

/// One observed access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent
{
    /// The variable was read and holds `value`
    Read
    {
        /// Current value
        value: u64,
    },
    /// The variable was stored to
    Write
    {
        /// Value before the store, as last observed by the supervisor
        previous: u64,
        /// Value after the store
        current: u64,
    },
}

/// Format an event as an output line, without the trailing newline.
///
/// ```rust
/// use varwatch_core::events::{format_event, WatchEvent};
///
/// assert_eq!(format_event("counter", &WatchEvent::Read { value: 7 }), "counter\tread\t7");
/// assert_eq!(
///     format_event("counter", &WatchEvent::Write { previous: 7, current: 8 }),
///     "counter\twrite\t7 -> 8"
/// );
/// ```
#[must_use]
pub fn format_event(symbol: &str, event: &WatchEvent) -> String
{
    match event {
        WatchEvent::Read { value } => format!("{symbol}\t{}\t{value}", AccessKind::Read),
        WatchEvent::Write { previous, current } => {
            format!("{symbol}\t{}\t{previous} -> {current}", AccessKind::Write)
        }
    }
}

/// Write one event line and flush, so lines appear as the target runs.
pub fn write_event<W: Write + ?Sized>(out: &mut W, symbol: &str, event: &WatchEvent) -> VarwatchResult<()>
{
    writeln!(out, "{}", format_event(symbol, event))?;
    out.flush()?;
    Ok(())
}
