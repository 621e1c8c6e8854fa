use goblin::mach::MachO;

use crate::container::{AddressSpace, Format, Image, Region, read_mapped};

/// Section the Go linker emits for build info on Darwin targets.
pub const BUILDINFO_SECTION: &str = "__go_buildinfo";

/// `VM_PROT_READ | VM_PROT_WRITE`
const PROT_RW: u32 = 3;

pub struct MachImage<'a> {
    macho: MachO<'a>,
}

impl<'a> MachImage<'a> {
    pub fn new(macho: MachO<'a>) -> Self {
        Self { macho }
    }

    fn named_section(&self) -> Option<Region<'a>> {
        self.macho.segments.iter().find_map(|segment| {
            let sections = segment.sections().ok()?;
            sections.into_iter().find_map(|(section, data)| {
                (section.name().ok()? == BUILDINFO_SECTION).then(|| Region::new(section.addr, data))
            })
        })
    }

    /// First non-empty segment mapped read-write, as `__DATA` is.
    fn data_segment(&self) -> Option<Region<'a>> {
        self.macho
            .segments
            .iter()
            .find(|seg| {
                seg.vmaddr != 0
                    && seg.filesize != 0
                    && seg.initprot == PROT_RW
                    && seg.maxprot == PROT_RW
            })
            .map(|seg| Region::new(seg.vmaddr, seg.data))
    }
}

impl<'a> AddressSpace<'a> for MachImage<'a> {
    fn read_at(&self, addr: u64, len: u64) -> Option<&'a [u8]> {
        self.macho
            .segments
            .iter()
            .filter(|seg| seg.filesize > 0)
            .find_map(|seg| read_mapped(seg.vmaddr, seg.data, addr, len))
    }
}

impl<'a> Image<'a> for MachImage<'a> {
    fn format(&self) -> Format {
        Format::MachO
    }

    fn data_start(&self) -> Option<Region<'a>> {
        self.named_section().or_else(|| self.data_segment())
    }

    fn address_space(&self) -> &dyn AddressSpace<'a> {
        self
    }
}
