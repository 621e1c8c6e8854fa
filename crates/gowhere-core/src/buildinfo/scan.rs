//! Raw-byte fallback for images whose data region yields nothing.
//!
//! Two markers are accepted, whichever comes first by offset: an inline
//! build info header, or a module info block framed by its sentinels.

use crate::buildinfo::find_from;
use crate::buildinfo::header::{self, MAGIC};
use crate::buildinfo::model::BuildInfo;
use crate::buildinfo::modinfo::{INFO_END, INFO_START, ModInfo};

/// Longest module info block the scan will frame.
pub const MAX_MODINFO_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Header,
    Sentinel,
}

/// Scan at most `limit` bytes of `bytes` for build information.
///
/// Returns the file offset of the winning marker with the decoded info.
pub fn scan(bytes: &[u8], limit: usize) -> Option<(usize, BuildInfo)> {
    let window = &bytes[..bytes.len().min(limit)];

    let mut next_header = find_from(window, MAGIC, 0);
    let mut next_sentinel = find_from(window, &INFO_START, 0);

    loop {
        let (at, marker) = match (next_header, next_sentinel) {
            (Some(h), Some(s)) if h <= s => (h, Marker::Header),
            (Some(h), None) => (h, Marker::Header),
            (_, Some(s)) => (s, Marker::Sentinel),
            (None, None) => return None,
        };

        let found = match marker {
            Marker::Header => from_header(&window[at..]),
            Marker::Sentinel => from_sentinel(window, at),
        };
        if let Some(info) = found {
            tracing::debug!(offset = at, ?marker, "scan matched build info");
            return Some((at, info));
        }

        match marker {
            Marker::Header => next_header = find_from(window, MAGIC, at + 1),
            Marker::Sentinel => next_sentinel = find_from(window, &INFO_START, at + 1),
        }
    }
}

fn from_header(at: &[u8]) -> Option<BuildInfo> {
    let raw = header::decode(at, None).ok()?;
    let info = ModInfo::parse(&raw.modinfo).ok()?;
    BuildInfo::from_parts(Some(raw.go_version), info)
}

fn from_sentinel(window: &[u8], at: usize) -> Option<BuildInfo> {
    let body = at + INFO_START.len();
    let limit = window.len().min(body.saturating_add(MAX_MODINFO_LEN + INFO_END.len()));
    let end = find_from(&window[..limit], &INFO_END, body)?;

    let text = std::str::from_utf8(&window[body..end]).ok()?;
    let info = ModInfo::parse(text).ok()?;
    BuildInfo::from_parts(None, info)
}
