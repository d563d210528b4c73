//! # Watch Supervisor
//!
//! Ties the pipeline together for one run:
//!
//! 1. Resolve the symbol in the on-disk binary and check its size
//! 2. Launch the target stopped at exec
//! 3. Find the load base and compute the runtime address
//! 4. Snapshot the current value, arm DR0/DR1/DR7
//! 5. Resume and hand control to the [`TrapDispatcher`]
//!
//! Everything in step 1 happens before a process exists, so resolution
//! errors never leave a child behind.

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::dispatch::{TrapDispatcher, WatchSummary, WatchTarget};
use crate::error::VarwatchResult;
use crate::symbols::BinaryImage;
use crate::types::WatchWidth;

/// What to watch and what to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest
{
    /// Symbol name, matched exactly
    pub symbol: String,
    /// Executable to launch
    pub executable: PathBuf,
    /// Arguments passed after `argv[0]`
    pub args: Vec<String>,
}

/// Symbol lookup result used to arm the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSymbol
{
    /// Link-time address
    pub address: u64,
    /// Watch width derived from the symbol size
    pub width: WatchWidth,
    /// Lowest `PT_LOAD` address of the image
    pub link_base: u64,
}

/// Resolve `request.symbol` in `request.executable` without launching anything.
pub fn resolve(request: &WatchRequest) -> VarwatchResult<ResolvedSymbol>
{
    let image = BinaryImage::load(&request.executable)?;
    let symbol = image.resolve_symbol(&request.symbol)?;
    let width = symbol.watch_width()?;
    let link_base = image.link_base()?;
    debug!(
        path = %image.path().display(),
        position_independent = image.is_position_independent()?,
        link_base = format_args!("0x{link_base:x}"),
        "Loaded executable image"
    );
    Ok(ResolvedSymbol {
        address: symbol.address,
        width,
        link_base,
    })
}

/// Run the target to completion, writing one line per access to `out`.
///
/// ## Errors
///
/// Every failure is fatal; see [`crate::error::VarwatchError`] for the
/// variants each stage can produce.
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
pub fn watch<W: Write + ?Sized>(request: &WatchRequest, out: &mut W) -> VarwatchResult<WatchSummary>
{
    use crate::memory::read_value;
    use crate::platform::linux::TracedProcess;
    use crate::symbols::runtime_address;
    use crate::tracee::Tracee;
    use crate::watchpoints::WatchpointPlan;

    let resolved = resolve(request)?;
    debug!(symbol = %request.symbol, ?resolved, "Symbol resolved");

    let mut process = TracedProcess::launch(&request.executable, &request.args)?;
    let load_base = process.load_base()?;
    let address = runtime_address(load_base, resolved.link_base, resolved.address)?;

    let initial = read_value(&process, address, resolved.width)?;
    WatchpointPlan::new(address, resolved.width).install(&mut process)?;
    info!(
        symbol = %request.symbol,
        %address,
        width = %resolved.width,
        initial,
        "Watching"
    );

    process.resume(None)?;
    let target = WatchTarget {
        symbol: request.symbol.clone(),
        address,
        width: resolved.width,
    };
    TrapDispatcher::new(&mut process, target, initial, out).run()
}

/// Run the target to completion, writing one line per access to `out`.
///
/// Only Linux on x86-64 can supervise a target; elsewhere the symbol is still
/// resolved (so resolution errors keep their meaning) and then launching fails.
#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
pub fn watch<W: Write + ?Sized>(request: &WatchRequest, _out: &mut W) -> VarwatchResult<WatchSummary>
{
    let resolved = resolve(request)?;
    debug!(symbol = %request.symbol, ?resolved, "Symbol resolved");
    info!("Process supervision is not available on this platform");
    Err(crate::error::VarwatchError::LaunchFailed(
        "hardware watchpoints require Linux on x86-64".to_string(),
    ))
}
