//! On-disk ELF image and symbol table lookup.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use object::elf;
use object::read::elf::{FileHeader, ProgramHeader, SectionHeader, Sym, SymbolTable};
use object::{Endianness, SectionIndex};
use tracing::{debug, trace};

use crate::error::{VarwatchError, VarwatchResult};
use crate::types::SymbolDescriptor;

type ElfHeader = elf::FileHeader64<Endianness>;

/// Only these two sections are searched, in file order.
const SYMBOL_TABLE_SECTIONS: [&[u8]; 2] = [b".symtab", b".dynsym"];

/// Mapping granularity used by the kernel ELF loader on x86-64.
const PAGE_SIZE: u64 = 0x1000;

/// Offset of the class byte in `e_ident`
const EI_CLASS: usize = 4;

fn malformed(err: object::read::Error) -> VarwatchError
{
    VarwatchError::MalformedBinary(err.to_string())
}

/// Reject anything that is not a 64-bit ELF file before handing it to the parser.
fn check_ident(data: &[u8]) -> VarwatchResult<()>
{
    let header_size = mem::size_of::<ElfHeader>();
    if data.len() < header_size {
        return Err(VarwatchError::NotAnExecutable(format!(
            "file is {} bytes, smaller than an ELF header ({header_size} bytes)",
            data.len()
        )));
    }
    if data[..elf::ELFMAG.len()] != elf::ELFMAG {
        return Err(VarwatchError::NotAnExecutable("missing ELF magic".to_string()));
    }
    match data[EI_CLASS] {
        elf::ELFCLASS64 => Ok(()),
        elf::ELFCLASS32 => Err(VarwatchError::UnsupportedFormat("32-bit ELF".to_string())),
        other => Err(VarwatchError::UnsupportedFormat(format!("unknown ELF class {other}"))),
    }
}

/// A whole ELF64 file loaded into memory.
///
/// The file is read once; every query re-walks the headers of that buffer.
/// All header-derived offsets go through `object`'s bounds-checked readers,
/// so a corrupted file yields `MalformedBinary` instead of an out-of-bounds read.
pub struct BinaryImage
{
    path: PathBuf,
    data: Vec<u8>,
}

impl BinaryImage
{
    /// Read and validate the binary at `path`.
    ///
    /// ## Errors
    ///
    /// - `ReadBinary`: the file cannot be read
    /// - `NotAnExecutable`: too small for an ELF header, or bad magic
    /// - `UnsupportedFormat`: not ELFCLASS64
    pub fn load(path: impl AsRef<Path>) -> VarwatchResult<Self>
    {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| VarwatchError::ReadBinary {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), size = data.len(), "Loaded binary image");
        Self::from_bytes(path, data)
    }

    /// Wrap an already-loaded buffer; `path` is only used for messages.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> VarwatchResult<Self>
    {
        check_ident(&data)?;
        Ok(Self {
            path: path.into(),
            data,
        })
    }

    /// Path the image was loaded from
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    fn header(&self) -> VarwatchResult<(&ElfHeader, Endianness)>
    {
        let header = ElfHeader::parse(self.data.as_slice()).map_err(malformed)?;
        let endian = header.endian().map_err(malformed)?;
        Ok((header, endian))
    }

    /// Whether the image is position independent (`ET_DYN`)
    pub fn is_position_independent(&self) -> VarwatchResult<bool>
    {
        let (header, endian) = self.header()?;
        Ok(header.e_type(endian) == elf::ET_DYN)
    }

    /// Lowest page-aligned `PT_LOAD` virtual address.
    ///
    /// This is the link-time address of the first byte the loader maps, so the
    /// load bias of a running image is `load_base - link_base`. PIE images
    /// link at 0; fixed-address executables typically at `0x400000`.
    pub fn link_base(&self) -> VarwatchResult<u64>
    {
        let (header, endian) = self.header()?;
        let segments = header.program_headers(endian, self.data.as_slice()).map_err(malformed)?;
        let lowest = segments
            .iter()
            .filter(|segment| segment.p_type(endian) == elf::PT_LOAD)
            .map(|segment| {
                let vaddr: u64 = segment.p_vaddr(endian).into();
                vaddr & !(PAGE_SIZE - 1)
            })
            .min();
        Ok(lowest.unwrap_or(0))
    }

    /// Find the first `.symtab` / `.dynsym` entry named exactly `name`.
    ///
    /// Undefined entries are returned too (with `defined == false`); use
    /// [`BinaryImage::resolve_symbol`] for the checked variant.
    pub fn lookup_symbol(&self, name: &str) -> VarwatchResult<Option<SymbolDescriptor>>
    {
        let data = self.data.as_slice();
        let (header, endian) = self.header()?;
        let sections = header.sections(endian, data).map_err(malformed)?;

        for (index, section) in sections.iter().enumerate() {
            let section_name = sections.section_name(endian, section).map_err(malformed)?;
            if !SYMBOL_TABLE_SECTIONS.iter().any(|wanted| *wanted == section_name) {
                continue;
            }

            let table = SymbolTable::parse(endian, data, &sections, SectionIndex(index), section).map_err(malformed)?;
            trace!(
                section = %String::from_utf8_lossy(section_name),
                link = section.sh_link(endian),
                entries = table.len(),
                "Scanning symbol table"
            );

            for symbol in table.iter() {
                if symbol.st_name(endian) == 0 {
                    continue;
                }
                if table.symbol_name(endian, symbol).map_err(malformed)? != name.as_bytes() {
                    continue;
                }
                return Ok(Some(SymbolDescriptor {
                    address: symbol.st_value(endian).into(),
                    size: symbol.st_size(endian).into(),
                    defined: symbol.st_shndx(endian) != elf::SHN_UNDEF,
                }));
            }
        }

        Ok(None)
    }

    /// Find `name` and insist that it is defined in this image.
    ///
    /// ## Errors
    ///
    /// - `SymbolNotFound`: no entry with that exact name
    /// - `UndefinedSymbol`: the entry is `SHN_UNDEF`
    /// - `MalformedBinary`: a header or table points outside the file
    pub fn resolve_symbol(&self, name: &str) -> VarwatchResult<SymbolDescriptor>
    {
        let symbol = self
            .lookup_symbol(name)?
            .ok_or_else(|| VarwatchError::SymbolNotFound {
                name: name.to_string(),
                path: self.path.clone(),
            })?;

        if !symbol.defined {
            return Err(VarwatchError::UndefinedSymbol { name: name.to_string() });
        }

        debug!(
            symbol = name,
            address = format_args!("0x{:x}", symbol.address),
            size = symbol.size,
            "Resolved symbol"
        );
        Ok(symbol)
    }
}
