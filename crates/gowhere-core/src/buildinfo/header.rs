//! The 32-byte build info header:
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..14  | magic `\xff Go buildinf:`                 |
//! | 14     | pointer size (4 or 8)                     |
//! | 15     | flags: `0x1` big endian, `0x2` inline     |
//! | 16..32 | two pointers to Go string headers, or pad |
//!
//! With the inline flag the Go version and module info follow the header as
//! uvarint-length-prefixed strings. Without it the pointers must be resolved
//! through the image's virtual address map.

use thiserror::Error;

use crate::buildinfo::find_from;
use crate::buildinfo::modinfo::strip_sentinels;
use crate::container::AddressSpace;

pub const MAGIC: &[u8; 14] = b"\xff Go buildinf:";
pub const HEADER_SIZE: usize = 32;
pub const HEADER_ALIGN: usize = 16;

const FLAG_BIG_ENDIAN: u8 = 0x1;
const FLAG_INLINE: u8 = 0x2;

/// Longest string accepted through a pointer header.
const MAX_STRING_LEN: u64 = 1 << 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("build info header truncated")]
    Truncated,

    #[error("unsupported pointer size {0}")]
    PointerSize(u8),

    #[error("pointer-format header needs an address map")]
    NoAddressSpace,

    #[error("address {addr:#x} is not mapped by the image")]
    Unmapped { addr: u64 },

    #[error("build info string is not valid UTF-8")]
    InvalidUtf8,

    #[error("header records no Go version")]
    NoVersion,
}

/// Strings recovered from a header before module info parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuildInfo {
    pub go_version: String,
    /// Module info with sentinels stripped; empty when the binary was built
    /// outside module mode.
    pub modinfo: String,
}

/// Locate the header inside a data region.
///
/// Only matches at an offset that is a multiple of `align` and with a full
/// header behind them count; the returned slice starts at the magic.
pub fn find_header(data: &[u8], align: usize) -> Option<&[u8]> {
    let align = align.max(1);
    let mut from = 0;
    loop {
        let at = find_from(data, MAGIC, from)?;
        if data.len() - at < HEADER_SIZE {
            return None;
        }
        if at % align == 0 {
            return Some(&data[at..]);
        }
        from = at.div_ceil(align) * align;
    }
}

/// Decode a header found by [`find_header`].
pub fn decode<'a>(
    header: &'a [u8],
    space: Option<&dyn AddressSpace<'a>>,
) -> Result<RawBuildInfo, HeaderError> {
    if header.len() < HEADER_SIZE || !header.starts_with(MAGIC) {
        return Err(HeaderError::Truncated);
    }
    let ptr_size = header[14];
    let flags = header[15];

    let (version, modinfo) = if flags & FLAG_INLINE != 0 {
        let (version, rest) = decode_string(&header[HEADER_SIZE..])?;
        let (modinfo, _) = decode_string(rest)?;
        (version, modinfo)
    } else {
        let space = space.ok_or(HeaderError::NoAddressSpace)?;
        let ptrs = Pointers::new(ptr_size, flags & FLAG_BIG_ENDIAN != 0)?;
        let size = ptrs.size;
        let version_at = ptrs.read(&header[16..])?;
        let modinfo_at = ptrs.read(&header[16 + size..])?;
        (
            ptrs.read_string(space, version_at)?,
            ptrs.read_string(space, modinfo_at)?,
        )
    };

    if version.is_empty() {
        return Err(HeaderError::NoVersion);
    }

    let go_version = std::str::from_utf8(version).map_err(|_| HeaderError::InvalidUtf8)?;
    let modinfo =
        std::str::from_utf8(strip_sentinels(modinfo)).map_err(|_| HeaderError::InvalidUtf8)?;

    Ok(RawBuildInfo {
        go_version: go_version.to_string(),
        modinfo: modinfo.to_string(),
    })
}

struct Pointers {
    size: usize,
    big_endian: bool,
}

impl Pointers {
    fn new(size: u8, big_endian: bool) -> Result<Self, HeaderError> {
        match size {
            4 | 8 => Ok(Self {
                size: size as usize,
                big_endian,
            }),
            other => Err(HeaderError::PointerSize(other)),
        }
    }

    fn read(&self, buf: &[u8]) -> Result<u64, HeaderError> {
        let bytes = buf.get(..self.size).ok_or(HeaderError::Truncated)?;
        let mut value = 0u64;
        if self.big_endian {
            for &b in bytes {
                value = (value << 8) | u64::from(b);
            }
        } else {
            for &b in bytes.iter().rev() {
                value = (value << 8) | u64::from(b);
            }
        }
        Ok(value)
    }

    /// Follow a Go string header `(data, len)` at `addr`.
    fn read_string<'a>(
        &self,
        space: &dyn AddressSpace<'a>,
        addr: u64,
    ) -> Result<&'a [u8], HeaderError> {
        let header_len = 2 * self.size as u64;
        let header = space
            .read_at(addr, header_len)
            .filter(|h| h.len() as u64 == header_len)
            .ok_or(HeaderError::Unmapped { addr })?;

        let data_at = self.read(header)?;
        let len = self.read(&header[self.size..])?;
        if len == 0 || len > MAX_STRING_LEN {
            return Ok(&[]);
        }

        space
            .read_at(data_at, len)
            .filter(|d| d.len() as u64 == len)
            .ok_or(HeaderError::Unmapped { addr: data_at })
    }
}

fn read_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, &b) in buf.iter().enumerate().take(10) {
        let chunk = u64::from(b & 0x7f);
        if i == 9 && b > 1 {
            return None;
        }
        value |= chunk << (7 * i);
        if b < 0x80 {
            return Some((value, i + 1));
        }
    }
    None
}

fn decode_string(buf: &[u8]) -> Result<(&[u8], &[u8]), HeaderError> {
    let (len, width) = read_uvarint(buf).ok_or(HeaderError::Truncated)?;
    let rest = &buf[width..];
    let len = usize::try_from(len).map_err(|_| HeaderError::Truncated)?;
    if len > rest.len() {
        return Err(HeaderError::Truncated);
    }
    Ok(rest.split_at(len))
}
