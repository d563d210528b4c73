//! # Memory Access
//!
//! Reading the watched variable out of the traced process.
//!
//! `PTRACE_PEEKDATA` only returns whole machine words, so a value is read by
//! fetching the aligned word(s) that cover it and slicing out the bytes.
//! A watched variable of up to 8 bytes spans at most two words.

use crate::error::VarwatchResult;
use crate::types::{Address, WatchWidth};

/// Size of one `PTRACE_PEEKDATA` word on x86-64
pub const WORD_SIZE: usize = 8;

/// Source of word-sized reads from another address space.
///
/// Implemented by the live traced process, and by fakes in tests.
pub trait WordReader
{
    /// Read the word starting at `address` (expected to be word aligned).
    fn peek_word(&self, address: Address) -> VarwatchResult<u64>;
}

/// Read `len` bytes (at most `WORD_SIZE`) starting at `address`.
///
/// Bytes are returned in target memory order. Words are decoded with the
/// native byte order, which matches the tracee's.
pub fn read_bytes<R: WordReader + ?Sized>(reader: &R, address: Address, len: usize) -> VarwatchResult<Vec<u8>>
{
    debug_assert!(len <= WORD_SIZE);

    let word_size = WORD_SIZE as u64;
    let base = address.align_down(word_size);
    let skip = address.offset_in(word_size) as usize;

    let mut buffer = reader.peek_word(base)?.to_ne_bytes().to_vec();
    if skip + len > WORD_SIZE {
        buffer.extend_from_slice(&reader.peek_word(base + word_size)?.to_ne_bytes());
    }

    Ok(buffer[skip..skip + len].to_vec())
}

/// Read a `width`-byte unsigned value at `address`, zero-extended to 64 bits.
pub fn read_value<R: WordReader + ?Sized>(reader: &R, address: Address, width: WatchWidth) -> VarwatchResult<u64>
{
    let bytes = read_bytes(reader, address, width.bytes())?;
    let mut word = [0u8; WORD_SIZE];
    if cfg!(target_endian = "little") {
        word[..bytes.len()].copy_from_slice(&bytes);
    } else {
        word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(u64::from_ne_bytes(word))
}
