use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::read_bytes;
use crate::buildinfo::header;
use crate::buildinfo::model::BuildInfo;
use crate::buildinfo::modinfo::ModInfo;
use crate::buildinfo::scan;
use crate::container::{self, Format, Image};
use crate::error::ExtractError;

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Upper bound on raw bytes examined by the marker scan.
    pub scan_limit_bytes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            scan_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Where the build info was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatedBy {
    /// Header in the container's data region.
    Section,
    /// Marker scan over the raw file bytes.
    Scan,
}

impl fmt::Display for LocatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocatedBy::Section => "section",
            LocatedBy::Scan => "scan",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub format: Format,
    pub located_by: LocatedBy,
    pub info: BuildInfo,
}

/// Outcome of [`extract_bytes`] when nothing was found. Carries no path;
/// [`Miss::at`] attaches one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    UnknownFormat,
    NoBuildInfo(Format),
}

impl Miss {
    pub fn at(self, path: &Path) -> ExtractError {
        let path = path.to_path_buf();
        match self {
            Miss::UnknownFormat => ExtractError::NotABinary { path },
            Miss::NoBuildInfo(format) => ExtractError::NoProvenance { path, format },
        }
    }
}

/// Source package path (and the rest of the build info) of the executable
/// at `path`.
pub fn extract(path: &Path) -> Result<BuildInfo, ExtractError> {
    extract_with(path, &ExtractConfig::default()).map(|e| e.info)
}

pub fn extract_with(path: &Path, config: &ExtractConfig) -> Result<Extraction, ExtractError> {
    let bytes = read_bytes(path)?;
    extract_bytes(&bytes, config).map_err(|miss| miss.at(path))
}

/// Extract build info from an in-memory image.
///
/// The container's data region is tried first; the raw marker scan runs only
/// when that yields nothing. Unrecognized containers are never scanned.
pub fn extract_bytes(bytes: &[u8], config: &ExtractConfig) -> Result<Extraction, Miss> {
    let image = container::detect(bytes).ok_or(Miss::UnknownFormat)?;
    let format = image.format();
    tracing::debug!(%format, "container recognized");

    if let Some(info) = from_data_region(image.as_ref()) {
        return Ok(Extraction {
            format,
            located_by: LocatedBy::Section,
            info,
        });
    }

    if let Some((offset, info)) = scan::scan(bytes, config.scan_limit_bytes) {
        tracing::debug!(%format, offset, "build info recovered by scan");
        return Ok(Extraction {
            format,
            located_by: LocatedBy::Scan,
            info,
        });
    }

    Err(Miss::NoBuildInfo(format))
}

fn from_data_region<'a>(image: &dyn Image<'a>) -> Option<BuildInfo> {
    let format = image.format();
    let Some(region) = image.data_start() else {
        tracing::debug!(%format, "no data region");
        return None;
    };

    let Some(at) = header::find_header(region.data, image.header_align()) else {
        tracing::debug!(%format, addr = region.addr, "no build info header in data region");
        return None;
    };

    let raw = match header::decode(at, Some(image.address_space())) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(%format, error = %e, "build info header present but undecodable");
            return None;
        }
    };

    match ModInfo::parse(&raw.modinfo) {
        Ok(info) => BuildInfo::from_parts(Some(raw.go_version), info),
        Err(e) => {
            tracing::warn!(%format, error = %e, "module info unparsable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unknown_format() {
        let config = ExtractConfig::default();
        assert_eq!(
            extract_bytes(b"hello, world\n", &config),
            Err(Miss::UnknownFormat)
        );
        assert_eq!(extract_bytes(b"", &config), Err(Miss::UnknownFormat));
    }

    #[test]
    fn empty_wasm_module_has_no_build_info() {
        let wasm = wat::parse_str("(module (memory 1))").unwrap();
        assert_eq!(
            extract_bytes(&wasm, &ExtractConfig::default()),
            Err(Miss::NoBuildInfo(Format::Wasm))
        );
    }

    #[test]
    fn wasm_data_segment_build_info() {
        // Header + "go1.21.0" + framed "path\texample.org/org/tool\n".
        let wasm = wat::parse_str(
            r#"
            (module
              (memory 1)
              (data (i32.const 4096)
                "\ff Go buildinf:\08\02\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00"
                "\08go1.21.0"
                "\3a"
                "\30\77\af\0c\92\74\08\02\41\e1\c1\07\e6\d6\18\e6"
                "path\09example.org/org/tool\0a"
                "\f9\32\43\31\86\18\20\72\00\82\42\10\41\16\d8\f2")
            )
            "#,
        )
        .unwrap();

        let extraction = extract_bytes(&wasm, &ExtractConfig::default()).unwrap();
        assert_eq!(extraction.format, Format::Wasm);
        assert_eq!(extraction.located_by, LocatedBy::Section);
        assert_eq!(extraction.info.source_path, "example.org/org/tool");
        assert_eq!(extraction.info.go_version.as_deref(), Some("go1.21.0"));
    }

    #[test]
    fn located_by_display_matches_serde() {
        for located_by in [LocatedBy::Section, LocatedBy::Scan] {
            let json = serde_json::to_string(&located_by).unwrap();
            assert_eq!(json.trim_matches('"'), located_by.to_string());
        }
    }

    #[test]
    fn miss_attaches_path() {
        let err = Miss::NoBuildInfo(Format::Pe).at(Path::new("tool.exe"));
        assert!(matches!(
            err,
            ExtractError::NoProvenance {
                format: Format::Pe,
                ..
            }
        ));
        assert!(matches!(
            Miss::UnknownFormat.at(Path::new("x")),
            ExtractError::NotABinary { .. }
        ));
    }
}
