//! Symbol descriptor and watch width types.

use std::fmt;

use crate::error::{VarwatchError, VarwatchResult};

/// A symbol table entry, reduced to what the supervisor needs.
///
/// Produced once by the resolver from the on-disk binary and never changed
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolDescriptor
{
    /// Link-time address (`st_value`), independent of where the image gets loaded
    pub address: u64,
    /// Declared size in bytes (`st_size`)
    pub size: u64,
    /// `false` when the entry refers to another object (`st_shndx == SHN_UNDEF`)
    pub defined: bool,
}

impl SymbolDescriptor
{
    /// Watch width matching the declared size.
    ///
    /// ## Errors
    ///
    /// `UnsupportedWatchWidth` if the size is not 1, 2, 4 or 8.
    pub fn watch_width(&self) -> VarwatchResult<WatchWidth>
    {
        WatchWidth::try_from(self.size)
    }
}

/// Width of a hardware watch, in bytes.
///
/// x86-64 debug registers only accept these four lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchWidth
{
    /// 1 byte
    Byte,
    /// 2 bytes
    Word,
    /// 4 bytes
    Dword,
    /// 8 bytes
    Qword,
}

impl WatchWidth
{
    /// Width in bytes
    pub const fn bytes(self) -> usize
    {
        match self {
            WatchWidth::Byte => 1,
            WatchWidth::Word => 2,
            WatchWidth::Dword => 4,
            WatchWidth::Qword => 8,
        }
    }
}

impl TryFrom<u64> for WatchWidth
{
    type Error = VarwatchError;

    fn try_from(size: u64) -> Result<Self, Self::Error>
    {
        match size {
            1 => Ok(WatchWidth::Byte),
            2 => Ok(WatchWidth::Word),
            4 => Ok(WatchWidth::Dword),
            8 => Ok(WatchWidth::Qword),
            other => Err(VarwatchError::UnsupportedWatchWidth(other)),
        }
    }
}

impl fmt::Display for WatchWidth
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} bytes", self.bytes())
    }
}
