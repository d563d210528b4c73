//! Tests for platform-agnostic types

use std::path::{Path, PathBuf};

use varwatch_core::error::VarwatchError;
use varwatch_core::types::{Address, ExitInfo, MemoryRegion, ProcessId, ProcessState, SymbolDescriptor, WatchWidth};

#[test]
fn test_process_id_from_i32()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
}

#[test]
fn test_process_id_to_i32()
{
    let pid = ProcessId::from(54321);
    let value: i32 = pid.into();
    assert_eq!(value, 54321);
}

#[test]
fn test_process_id_equality()
{
    let pid1 = ProcessId::from(12345);
    let pid2 = ProcessId::from(12345);
    let pid3 = ProcessId::from(54321);

    assert_eq!(pid1, pid2);
    assert_ne!(pid1, pid3);
}

#[test]
fn test_address_alignment_helpers()
{
    let address = Address::new(0x5555_5555_8013);
    assert_eq!(address.align_down(8), Address::new(0x5555_5555_8010));
    assert_eq!(address.offset_in(8), 3);
    assert_eq!(address.checked_sub(0x14), Some(Address::new(0x5555_5555_7fff)));
    assert_eq!(Address::ZERO.checked_sub(1), None);
    assert_eq!(format!("{}", Address::new(0x10)), "0x0000000000000010");
}

#[test]
fn test_exit_info_codes()
{
    assert_eq!(ExitInfo::Exited(0).exit_code(), 0);
    assert_eq!(ExitInfo::Exited(42).exit_code(), 42);
    assert_eq!(ExitInfo::Signaled(11).exit_code(), 139);
    assert_eq!(ExitInfo::Signaled(9).to_string(), "killed by signal 9");
}

#[test]
fn test_process_state_terminated()
{
    assert!(ProcessState::Terminated(ExitInfo::Exited(1)).is_terminated());
    assert!(!ProcessState::Running.is_terminated());
}

#[test]
fn test_watch_width_from_size()
{
    assert_eq!(WatchWidth::try_from(1).unwrap(), WatchWidth::Byte);
    assert_eq!(WatchWidth::try_from(2).unwrap(), WatchWidth::Word);
    assert_eq!(WatchWidth::try_from(4).unwrap(), WatchWidth::Dword);
    assert_eq!(WatchWidth::try_from(8).unwrap(), WatchWidth::Qword);

    for size in [0, 3, 5, 16, 4096] {
        assert!(matches!(
            WatchWidth::try_from(size),
            Err(VarwatchError::UnsupportedWatchWidth(s)) if s == size
        ));
    }
}

#[test]
fn test_symbol_descriptor_width()
{
    let symbol = SymbolDescriptor {
        address: 0x4010,
        size: 4,
        defined: true,
    };
    assert_eq!(symbol.watch_width().unwrap().bytes(), 4);

    let array = SymbolDescriptor { size: 3, ..symbol };
    assert!(array.watch_width().is_err());
}

#[test]
fn test_memory_region_new()
{
    let region = MemoryRegion::new(Address::new(0x1000), Address::new(0x2000), Some(PathBuf::from("[heap]")));

    assert_eq!(region.start, Address::new(0x1000));
    assert_eq!(region.end, Address::new(0x2000));
    assert_eq!(region.path.as_deref(), Some(Path::new("[heap]")));
}
