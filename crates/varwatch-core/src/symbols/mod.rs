//! # Symbol Resolution
//!
//! Finds a named variable in the target's on-disk ELF image and turns its
//! link-time address into the address it will have in the running process.
//!
//! Resolution happens before the target is launched, so a bad symbol name or
//! an unwatchable size is reported without ever creating a process.
//!
//! ## Address translation
//!
//! ```text
//! runtime = load_base - link_base + st_value
//! ```
//!
//! `load_base` is the lowest mapping of the executable in `/proc/<pid>/maps`
//! and `link_base` the lowest `PT_LOAD` address in the file (0 for PIE).

mod image;

pub use image::BinaryImage;

use crate::error::{VarwatchError, VarwatchResult};
use crate::types::Address;

/// Translate a link-time symbol address into a runtime address.
///
/// ## Errors
///
/// `AddressOutOfRange` if the load bias is negative or the sum overflows.
///
/// ```rust
/// use varwatch_core::symbols::runtime_address;
/// use varwatch_core::types::Address;
///
/// // PIE: linked at 0, mapped at 0x5555_5555_4000
/// let pie = runtime_address(Address::new(0x5555_5555_4000), 0, 0x4010).unwrap();
/// assert_eq!(pie, Address::new(0x5555_5555_8010));
///
/// // Fixed-address executable: bias is zero
/// let fixed = runtime_address(Address::new(0x40_0000), 0x40_0000, 0x40_4028).unwrap();
/// assert_eq!(fixed, Address::new(0x40_4028));
/// ```
pub fn runtime_address(load_base: Address, link_base: u64, symbol_address: u64) -> VarwatchResult<Address>
{
    let out_of_range = || VarwatchError::AddressOutOfRange {
        base: load_base,
        offset: symbol_address,
    };

    load_base
        .checked_sub(link_base)
        .and_then(|bias| bias.checked_add(symbol_address))
        .ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_runtime_address_overflow()
    {
        let result = runtime_address(Address::new(u64::MAX - 4), 0, 0x10);
        assert!(matches!(result, Err(VarwatchError::AddressOutOfRange { .. })));
    }

    #[test]
    fn test_runtime_address_negative_bias()
    {
        let result = runtime_address(Address::new(0x1000), 0x40_0000, 0x40_1000);
        assert!(matches!(result, Err(VarwatchError::AddressOutOfRange { .. })));
    }

    #[test]
    fn test_runtime_address_fixed_executable_has_zero_bias()
    {
        let address = runtime_address(Address::new(0x40_0000), 0x40_0000, 0x40_4028).unwrap();
        assert_eq!(address, Address::new(0x40_4028));
    }

    #[test]
    fn test_runtime_address_pie_adds_load_base()
    {
        let address = runtime_address(Address::new(0x5555_5555_4000), 0, 0x4010).unwrap();
        assert_eq!(address, Address::new(0x5555_5555_8010));
    }

    #[test]
    fn test_runtime_address_with_bias()
    {
        let address = runtime_address(Address::new(0x7f00_0000_0000), 0x1000, 0x2468).unwrap();
        assert_eq!(address, Address::new(0x7f00_0000_1468));
    }
}
