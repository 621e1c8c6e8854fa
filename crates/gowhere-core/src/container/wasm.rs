use wasmparser::{Parser, Payload};

use crate::buildinfo::{find_from, header};
use crate::container::{AddressSpace, Format, Image, Region};

pub const MAGIC: &[u8; 4] = b"\0asm";

/// Data segments of a WebAssembly module.
///
/// Go's wasm targets always write build info inline, so segments are only
/// searched, never addressed.
pub struct WasmImage<'a> {
    segments: Vec<&'a [u8]>,
}

impl<'a> WasmImage<'a> {
    /// Collect data segments. Parsing stops at the first malformed payload;
    /// whatever was collected before it is kept.
    pub fn parse(bytes: &'a [u8]) -> Self {
        let mut segments = Vec::new();

        for payload in Parser::new(0).parse_all(bytes) {
            match payload {
                Ok(Payload::DataSection(reader)) => {
                    for data in reader {
                        match data {
                            Ok(data) => segments.push(data.data),
                            Err(e) => {
                                tracing::debug!(error = %e, "malformed wasm data segment");
                                break;
                            }
                        }
                    }
                }
                Ok(Payload::End(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "wasm parse stopped");
                    break;
                }
            }
        }

        Self { segments }
    }

    #[cfg(test)]
    fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl<'a> AddressSpace<'a> for WasmImage<'a> {
    fn read_at(&self, _addr: u64, _len: u64) -> Option<&'a [u8]> {
        None
    }
}

impl<'a> Image<'a> for WasmImage<'a> {
    fn format(&self) -> Format {
        Format::Wasm
    }

    /// First data segment holding the build info magic.
    fn data_start(&self) -> Option<Region<'a>> {
        self.segments
            .iter()
            .find(|seg| find_from(seg, header::MAGIC, 0).is_some())
            .map(|seg| Region::new(0, *seg))
    }

    fn address_space(&self) -> &dyn AddressSpace<'a> {
        self
    }

    fn header_align(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_data_segments() {
        let wasm = wat::parse_str(
            r#"
            (module
              (memory 1)
              (data (i32.const 16) "first")
              (data (i32.const 64) "second")
            )
            "#,
        )
        .unwrap();

        let image = WasmImage::parse(&wasm);
        assert_eq!(image.segment_count(), 2);
        assert!(image.data_start().is_none());
    }

    #[test]
    fn data_start_is_segment_with_magic() {
        let wasm = wat::parse_str(
            r#"
            (module
              (memory 1)
              (data (i32.const 16) "runtime.text")
              (data (i32.const 64) "pad\ff Go buildinf:\08\02")
            )
            "#,
        )
        .unwrap();

        let image = WasmImage::parse(&wasm);
        let region = image.data_start().unwrap();
        assert!(region.data.starts_with(b"pad\xff Go buildinf:"));
        assert_eq!(image.header_align(), 1);
    }

    #[test]
    fn truncated_module_keeps_what_parsed() {
        let mut wasm = wat::parse_str(r#"(module (memory 1) (data (i32.const 0) "abc"))"#).unwrap();
        wasm.extend_from_slice(&[0x0b, 0xff, 0xff]);

        let image = WasmImage::parse(&wasm);
        assert_eq!(image.segment_count(), 1);
        assert_eq!(image.format(), Format::Wasm);
    }
}
