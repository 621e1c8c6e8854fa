//! Executable container formats and the two things extraction needs from
//! each of them: where the build info region starts, and how to read bytes
//! at a virtual address.

pub mod elf;
pub mod macho;
pub mod pe;
pub mod wasm;

use std::fmt;

use goblin::Object;
use goblin::mach::{Mach, SingleArch};
use serde::{Deserialize, Serialize};

/// Bytes of the data region searched for the build info header.
pub const DATA_WINDOW: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Elf,
    MachO,
    Pe,
    Wasm,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Elf => "elf",
            Format::MachO => "macho",
            Format::Pe => "pe",
            Format::Wasm => "wasm",
        })
    }
}

/// Read access to an image's memory layout as the loader would map it.
pub trait AddressSpace<'a> {
    /// Bytes at `addr`, at most `len` of them; fewer when the mapping ends
    /// first. `None` when nothing maps `addr`.
    fn read_at(&self, addr: u64, len: u64) -> Option<&'a [u8]>;
}

/// Start of the region the linker writes build info into.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub addr: u64,
    pub data: &'a [u8],
}

impl<'a> Region<'a> {
    /// Region clamped to [`DATA_WINDOW`].
    pub fn new(addr: u64, data: &'a [u8]) -> Self {
        Self {
            addr,
            data: &data[..data.len().min(DATA_WINDOW)],
        }
    }
}

pub trait Image<'a>: AddressSpace<'a> {
    fn format(&self) -> Format;

    fn data_start(&self) -> Option<Region<'a>>;

    fn address_space(&self) -> &dyn AddressSpace<'a>;

    /// Alignment the header must have relative to the region start.
    fn header_align(&self) -> usize {
        crate::buildinfo::header::HEADER_ALIGN
    }
}

/// Identify the container of `bytes`.
///
/// Total over arbitrary input: anything that is not a well-formed ELF,
/// Mach-O, PE or WebAssembly image yields `None`.
pub fn detect(bytes: &[u8]) -> Option<Box<dyn Image<'_> + '_>> {
    if bytes.starts_with(wasm::MAGIC) {
        return Some(Box::new(wasm::WasmImage::parse(bytes)));
    }

    let object = match Object::parse(bytes) {
        Ok(object) => object,
        Err(e) => {
            tracing::debug!(error = %e, "container parse failed");
            return None;
        }
    };

    match object {
        Object::Elf(elf) => Some(Box::new(elf::ElfImage::new(elf, bytes))),
        Object::PE(pe) => Some(Box::new(pe::PeImage::new(pe, bytes))),
        Object::Mach(Mach::Binary(macho)) => Some(Box::new(macho::MachImage::new(macho))),
        Object::Mach(Mach::Fat(fat)) => {
            // Every slice carries the same build info; take the first Mach-O one.
            (0..fat.narches).find_map(|i| match fat.get(i) {
                Ok(SingleArch::MachO(macho)) => {
                    Some(Box::new(macho::MachImage::new(macho)) as Box<dyn Image<'_> + '_>)
                }
                _ => None,
            })
        }
        _ => None,
    }
}

/// Slice `len` bytes at `offset` of `bytes`, clamped to the file end.
pub(crate) fn file_slice(bytes: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let len = usize::try_from(len).ok()?;
    let end = start.checked_add(len)?.min(bytes.len());
    bytes.get(start..end)
}

/// Read through a mapping of `[vaddr, vaddr + data.len())` onto `data`.
pub(crate) fn read_mapped<'a>(vaddr: u64, data: &'a [u8], addr: u64, len: u64) -> Option<&'a [u8]> {
    if addr < vaddr {
        return None;
    }
    let start = usize::try_from(addr - vaddr).ok()?;
    if start >= data.len() {
        return None;
    }
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    let end = start.saturating_add(len).min(data.len());
    Some(&data[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_rejects_non_images() {
        assert!(detect(b"").is_none());
        assert!(detect(b"#!/bin/sh\necho hi\n").is_none());
        assert!(detect(b"\x7fELF").is_none());
        assert!(detect(b"MZ\x90\x00").is_none());
        assert!(detect(&[0xcf, 0xfa, 0xed, 0xfe, 0x07]).is_none());
    }

    #[test]
    fn detect_recognizes_wasm_magic() {
        let image = detect(b"\0asm\x01\0\0\0").unwrap();
        assert_eq!(image.format(), Format::Wasm);
        assert!(image.data_start().is_none());
    }

    #[test]
    fn read_mapped_clamps_to_mapping() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(read_mapped(0x10, &data, 0x11, 2), Some(&data[1..3]));
        assert_eq!(read_mapped(0x10, &data, 0x12, 100), Some(&data[2..]));
        assert_eq!(read_mapped(0x10, &data, 0x14, 1), None);
        assert_eq!(read_mapped(0x10, &data, 0x0f, 1), None);
    }

    #[test]
    fn file_slice_clamps_to_file() {
        let bytes = [0u8; 8];
        assert_eq!(file_slice(&bytes, 4, 100).map(<[u8]>::len), Some(4));
        assert!(file_slice(&bytes, 9, 1).is_none());
        assert!(file_slice(&bytes, u64::MAX, 1).is_none());
    }

    #[test]
    fn region_is_windowed() {
        let big = vec![0u8; DATA_WINDOW * 2];
        assert_eq!(Region::new(0, &big).data.len(), DATA_WINDOW);
    }

    #[test]
    fn format_display_matches_serde() {
        for format in [Format::Elf, Format::MachO, Format::Pe, Format::Wasm] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json.trim_matches('"'), format.to_string());
        }
    }
}
