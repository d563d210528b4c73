//! Memory map lookup and load base discovery.

use std::path::Path;

use crate::types::{Address, MemoryRegion};

impl From<&proc_maps::MapRange> for MemoryRegion
{
    fn from(range: &proc_maps::MapRange) -> Self
    {
        let start = range.start() as u64;
        Self::new(
            Address::new(start),
            Address::new(start + range.size() as u64),
            range.filename().map(Path::to_path_buf),
        )
    }
}

/// Read the current memory map of `pid`.
#[cfg(target_os = "linux")]
pub fn read_regions(pid: crate::types::ProcessId) -> std::io::Result<Vec<MemoryRegion>>
{
    let ranges = proc_maps::get_process_maps(pid.raw())?;
    Ok(ranges.iter().map(MemoryRegion::from).collect())
}

/// Lowest region backed exactly by `path`.
///
/// `path` must be in the same form the kernel prints (canonical, absolute).
/// Mappings of other files, including ones whose path merely contains
/// `path` as a substring, are ignored.
pub fn find_load_base<'a>(regions: &'a [MemoryRegion], path: &Path) -> Option<&'a MemoryRegion>
{
    regions
        .iter()
        .filter(|region| region.path.as_deref() == Some(path))
        .min_by_key(|region| region.start)
}
