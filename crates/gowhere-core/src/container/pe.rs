use goblin::pe::PE;
use goblin::pe::section_table::SectionTable;

use crate::container::{AddressSpace, Format, Image, Region, file_slice, read_mapped};

pub const BUILDINFO_SECTION: &str = ".go.buildinfo";

const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x0000_0040;
const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
const IMAGE_SCN_MEM_WRITE: u32 = 0x8000_0000;
const IMAGE_SCN_ALIGN_32BYTES: u32 = 0x0060_0000;

pub struct PeImage<'a> {
    pe: PE<'a>,
    bytes: &'a [u8],
}

impl<'a> PeImage<'a> {
    pub fn new(pe: PE<'a>, bytes: &'a [u8]) -> Self {
        Self { pe, bytes }
    }

    fn image_base(&self) -> u64 {
        self.pe.image_base as u64
    }

    fn raw_data(&self, section: &SectionTable) -> Option<&'a [u8]> {
        file_slice(
            self.bytes,
            u64::from(section.pointer_to_raw_data),
            u64::from(section.size_of_raw_data),
        )
    }

    fn region(&self, section: &SectionTable) -> Option<Region<'a>> {
        let data = self.raw_data(section)?;
        Some(Region::new(
            u64::from(section.virtual_address) + self.image_base(),
            data,
        ))
    }

    fn named_section(&self) -> Option<Region<'a>> {
        let section = self
            .pe
            .sections
            .iter()
            .find(|s| s.name().ok() == Some(BUILDINFO_SECTION))?;
        self.region(section)
    }

    /// First initialized, read-write data section.
    fn data_section(&self) -> Option<Region<'a>> {
        let wanted = IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE;
        let section = self.pe.sections.iter().find(|s| {
            s.virtual_address != 0
                && s.size_of_raw_data != 0
                && s.characteristics & !IMAGE_SCN_ALIGN_32BYTES == wanted
        })?;
        self.region(section)
    }
}

impl<'a> AddressSpace<'a> for PeImage<'a> {
    fn read_at(&self, addr: u64, len: u64) -> Option<&'a [u8]> {
        let rva = addr.checked_sub(self.image_base())?;
        self.pe.sections.iter().find_map(|section| {
            let data = self.raw_data(section)?;
            read_mapped(u64::from(section.virtual_address), data, rva, len)
        })
    }
}

impl<'a> Image<'a> for PeImage<'a> {
    fn format(&self) -> Format {
        Format::Pe
    }

    fn data_start(&self) -> Option<Region<'a>> {
        self.named_section().or_else(|| self.data_section())
    }

    fn address_space(&self) -> &dyn AddressSpace<'a> {
        self
    }
}
