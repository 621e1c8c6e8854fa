//! Go build information: the header blob the linker places in the data
//! region, the module info text it points at, and the raw-byte scan used
//! when the container gives no usable region.

pub mod header;
pub mod model;
pub mod modinfo;
pub mod scan;

/// Offset of the first occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
