//! Symbol resolution against real ELF files.
//!
//! The test binary itself is the fixture: it exports a few statics with
//! unmangled names and looks them up in its own image.

use std::fs;
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use varwatch_core::error::VarwatchError;
use varwatch_core::symbols::{runtime_address, BinaryImage};
use varwatch_core::types::WatchWidth;

#[no_mangle]
pub static VARWATCH_PROBE_COUNTER: AtomicU64 = AtomicU64::new(7);

#[no_mangle]
pub static VARWATCH_PROBE_TRIPLE: [u8; 3] = [1, 2, 3];

fn current_exe() -> PathBuf
{
    std::env::current_exe().unwrap()
}

fn current_image() -> BinaryImage
{
    black_box(&VARWATCH_PROBE_COUNTER).fetch_add(1, Ordering::Relaxed);
    black_box(&VARWATCH_PROBE_TRIPLE);
    BinaryImage::load(current_exe()).unwrap()
}

#[test]
fn test_resolves_exported_static()
{
    let image = current_image();
    let symbol = image.resolve_symbol("VARWATCH_PROBE_COUNTER").unwrap();

    assert!(symbol.defined);
    assert_eq!(symbol.size, 8);
    assert_ne!(symbol.address, 0);
    assert_eq!(symbol.watch_width().unwrap(), WatchWidth::Qword);
}

#[test]
fn test_odd_sized_symbol_is_found_but_not_watchable()
{
    let image = current_image();
    let symbol = image.resolve_symbol("VARWATCH_PROBE_TRIPLE").unwrap();

    assert_eq!(symbol.size, 3);
    assert!(matches!(
        symbol.watch_width(),
        Err(VarwatchError::UnsupportedWatchWidth(3))
    ));
}

#[test]
fn test_names_match_exactly()
{
    let image = current_image();
    for name in ["VARWATCH_PROBE", "VARWATCH_PROBE_COUNTER_", "varwatch_probe_counter", ""] {
        assert!(
            matches!(image.resolve_symbol(name), Err(VarwatchError::SymbolNotFound { .. })),
            "{name:?} should not resolve"
        );
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_imported_function_is_undefined()
{
    let image = current_image();
    assert!(matches!(
        image.resolve_symbol("malloc"),
        Err(VarwatchError::UndefinedSymbol { .. })
    ));
}

#[test]
fn test_missing_file()
{
    let result = BinaryImage::load("/nonexistent/varwatch/target");
    assert!(matches!(result, Err(VarwatchError::ReadBinary { .. })));
}

#[test]
fn test_script_is_not_an_executable()
{
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("run.sh");
    fs::write(&script, "#!/bin/sh\necho this is a shell script, not an ELF image\nexit 0\n").unwrap();

    assert!(matches!(
        BinaryImage::load(&script),
        Err(VarwatchError::NotAnExecutable(_))
    ));
}

#[test]
fn test_truncated_image_is_malformed()
{
    let data = fs::read(current_exe()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let truncated = dir.path().join("truncated");
    fs::write(&truncated, &data[..4096]).unwrap();

    let image = BinaryImage::load(&truncated).unwrap();
    assert!(matches!(
        image.resolve_symbol("VARWATCH_PROBE_COUNTER"),
        Err(VarwatchError::MalformedBinary(_))
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn test_runtime_address_matches_live_pointer()
{
    use varwatch_core::maps::{find_load_base, read_regions};
    use varwatch_core::types::ProcessId;

    let image = current_image();
    let symbol = image.resolve_symbol("VARWATCH_PROBE_COUNTER").unwrap();
    let link_base = image.link_base().unwrap();

    let regions = read_regions(ProcessId(std::process::id() as i32)).unwrap();
    let executable = fs::canonicalize(current_exe()).unwrap();
    let load_base = find_load_base(&regions, &executable).expect("executable is mapped").start;

    let address = runtime_address(load_base, link_base, symbol.address).unwrap();
    assert_eq!(address.value(), &VARWATCH_PROBE_COUNTER as *const AtomicU64 as u64);
}
