use goblin::elf::Elf;
use goblin::elf::program_header::{PF_W, PF_X, PT_LOAD};
use goblin::elf::section_header::SHT_NOBITS;

use crate::container::{AddressSpace, Format, Image, Region, file_slice, read_mapped};

/// Section the Go linker emits for build info on ELF targets.
pub const BUILDINFO_SECTION: &str = ".go.buildinfo";

pub struct ElfImage<'a> {
    elf: Elf<'a>,
    bytes: &'a [u8],
}

impl<'a> ElfImage<'a> {
    pub fn new(elf: Elf<'a>, bytes: &'a [u8]) -> Self {
        Self { elf, bytes }
    }

    fn named_section(&self) -> Option<Region<'a>> {
        let sh = self.elf.section_headers.iter().find(|sh| {
            self.elf.shdr_strtab.get_at(sh.sh_name) == Some(BUILDINFO_SECTION)
        })?;
        if sh.sh_type == SHT_NOBITS {
            return None;
        }
        let data = file_slice(self.bytes, sh.sh_offset, sh.sh_size)?;
        Some(Region::new(sh.sh_addr, data))
    }

    /// First loadable segment that is writable but not executable.
    fn data_segment(&self) -> Option<Region<'a>> {
        let ph = self
            .elf
            .program_headers
            .iter()
            .find(|ph| ph.p_type == PT_LOAD && ph.p_flags & (PF_X | PF_W) == PF_W)?;
        let data = file_slice(self.bytes, ph.p_offset, ph.p_filesz)?;
        Some(Region::new(ph.p_vaddr, data))
    }
}

impl<'a> AddressSpace<'a> for ElfImage<'a> {
    fn read_at(&self, addr: u64, len: u64) -> Option<&'a [u8]> {
        let from_segments = self
            .elf
            .program_headers
            .iter()
            .filter(|ph| ph.p_type == PT_LOAD && ph.p_filesz > 0)
            .find_map(|ph| {
                let data = file_slice(self.bytes, ph.p_offset, ph.p_filesz)?;
                read_mapped(ph.p_vaddr, data, addr, len)
            });
        if from_segments.is_some() {
            return from_segments;
        }

        // Images without program headers still carry section addresses.
        self.elf
            .section_headers
            .iter()
            .filter(|sh| sh.sh_addr != 0 && sh.sh_type != SHT_NOBITS)
            .find_map(|sh| {
                let data = file_slice(self.bytes, sh.sh_offset, sh.sh_size)?;
                read_mapped(sh.sh_addr, data, addr, len)
            })
    }
}

impl<'a> Image<'a> for ElfImage<'a> {
    fn format(&self) -> Format {
        Format::Elf
    }

    fn data_start(&self) -> Option<Region<'a>> {
        self.named_section().or_else(|| self.data_segment())
    }

    fn address_space(&self) -> &dyn AddressSpace<'a> {
        self
    }
}
