//! Module info text as written by `go build`:
//!
//! ```text
//! go	go1.22.1
//! path	example.org/org/tool/cmd/tool
//! mod	example.org/org/tool	v1.4.2	h1:...
//! dep	github.com/pkg/errors	v0.9.1	h1:...
//! =>	../errors	(devel)
//! build	-compiler=gc
//! ```
//!
//! In the binary the text sits between two 16-byte sentinels.

use thiserror::Error;

use crate::buildinfo::model::{BuildSetting, Module};

/// Sentinel written before the module info text.
pub const INFO_START: [u8; 16] = [
    0x30, 0x77, 0xaf, 0x0c, 0x92, 0x74, 0x08, 0x02, 0x41, 0xe1, 0xc1, 0x07, 0xe6, 0xd6, 0x18, 0xe6,
];

/// Sentinel written after the module info text.
pub const INFO_END: [u8; 16] = [
    0xf9, 0x32, 0x43, 0x31, 0x86, 0x18, 0x20, 0x72, 0x00, 0x82, 0x42, 0x10, 0x41, 0x16, 0xd8, 0xf2,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModInfoError {
    #[error("line {line}: malformed module line")]
    MalformedModule { line: usize },

    #[error("line {line}: replacement without a preceding module")]
    OrphanReplacement { line: usize },

    #[error("line {line}: malformed build setting")]
    MalformedSetting { line: usize },
}

/// Parsed module info block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModInfo {
    pub go_version: Option<String>,
    pub path: Option<String>,
    pub main: Option<Module>,
    pub deps: Vec<Module>,
    pub settings: Vec<BuildSetting>,
}

/// Remove the sentinels around a module info string taken from a header.
///
/// The linker always terminates the text with a newline, so anything that
/// is too short or lacks it is treated as absent.
pub fn strip_sentinels(raw: &[u8]) -> &[u8] {
    if raw.len() >= 33 && raw[raw.len() - 17] == b'\n' {
        &raw[16..raw.len() - 16]
    } else {
        &[]
    }
}

enum Last {
    None,
    Main,
    Dep,
}

impl ModInfo {
    /// Parse module info text. Unknown line kinds are skipped.
    pub fn parse(text: &str) -> Result<Self, ModInfoError> {
        let mut info = ModInfo::default();
        let mut last = Last::None;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let Some((kind, rest)) = line.split_once('\t') else {
                continue;
            };

            match kind {
                "go" => info.go_version = Some(rest.to_string()),
                "path" => info.path = Some(rest.to_string()),
                "mod" => {
                    info.main = Some(parse_module(rest, line_no)?);
                    last = Last::Main;
                }
                "dep" => {
                    info.deps.push(parse_module(rest, line_no)?);
                    last = Last::Dep;
                }
                "=>" => {
                    let replacement = Box::new(parse_module(rest, line_no)?);
                    let target = match last {
                        Last::Main => info.main.as_mut(),
                        Last::Dep => info.deps.last_mut(),
                        Last::None => None,
                    };
                    match target {
                        Some(module) if module.replace.is_none() => {
                            module.replace = Some(replacement)
                        }
                        _ => return Err(ModInfoError::OrphanReplacement { line: line_no }),
                    }
                }
                "build" => info.settings.push(parse_setting(rest, line_no)?),
                _ => {}
            }
        }

        Ok(info)
    }
}

fn parse_module(rest: &str, line: usize) -> Result<Module, ModInfoError> {
    let fields: Vec<&str> = rest.split('\t').collect();
    let (path, version, sum) = match fields.as_slice() {
        [path, version] => (*path, *version, None),
        [path, version, sum] => (*path, *version, Some(*sum)),
        _ => return Err(ModInfoError::MalformedModule { line }),
    };
    if path.is_empty() {
        return Err(ModInfoError::MalformedModule { line });
    }

    Ok(Module {
        path: path.to_string(),
        version: version.to_string(),
        sum: sum.filter(|s| !s.is_empty()).map(str::to_string),
        replace: None,
    })
}

/// `key=value`, where either side may be a Go-quoted string.
fn parse_setting(rest: &str, line: usize) -> Result<BuildSetting, ModInfoError> {
    let malformed = || ModInfoError::MalformedSetting { line };

    let (key, value) = if rest.starts_with('"') {
        let (key, after) = take_quoted(rest).ok_or_else(malformed)?;
        let value = after.strip_prefix('=').ok_or_else(malformed)?;
        (key, unquote(value).ok_or_else(malformed)?)
    } else {
        let (key, value) = rest.split_once('=').ok_or_else(malformed)?;
        (key.to_string(), unquote(value).ok_or_else(malformed)?)
    };
    if key.is_empty() {
        return Err(malformed());
    }

    Ok(BuildSetting { key, value })
}

fn unquote(s: &str) -> Option<String> {
    if !s.starts_with('"') {
        return Some(s.to_string());
    }
    match take_quoted(s)? {
        (value, "") => Some(value),
        _ => None,
    }
}

/// Split a leading quoted string off `s`, returning the unescaped contents
/// and the remainder.
///
/// Accepts the escapes `strconv.Quote` produces. Unknown escapes, and byte
/// escapes that leave invalid UTF-8 behind, yield `None`.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while let Some(&b) = bytes.get(i) {
        match b {
            b'"' => {
                let value = String::from_utf8(out).ok()?;
                return Some((value, &body[i + 1..]));
            }
            b'\\' => {
                let esc = *bytes.get(i + 1)?;
                i += 2;
                match esc {
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'v' => out.push(0x0b),
                    b'\\' | b'"' | b'\'' => out.push(esc),
                    b'x' => {
                        let value = digits(bytes.get(i..i + 2)?, 16)?;
                        out.push(value as u8);
                        i += 2;
                    }
                    b'0'..=b'7' => {
                        let value = digits(bytes.get(i - 1..i + 2)?, 8)?;
                        out.push(u8::try_from(value).ok()?);
                        i += 2;
                    }
                    b'u' | b'U' => {
                        let n = if esc == b'u' { 4 } else { 8 };
                        let c = char::from_u32(digits(bytes.get(i..i + n)?, 16)?)?;
                        out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                        i += n;
                    }
                    _ => return None,
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    None
}

/// Value of ASCII `digits` in `radix`; at most 8 digits.
fn digits(digits: &[u8], radix: u32) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &d| {
        Some(acc * radix + char::from(d).to_digit(radix)?)
    })
}
