use serde::{Deserialize, Serialize};

use crate::buildinfo::modinfo::ModInfo;

/// Build provenance recovered from one executable.
///
/// `source_path` is never empty and is returned exactly as the binary
/// records it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub source_path: String,
    pub go_version: Option<String>,
    pub main_module: Option<Module>,
    pub deps: Vec<Module>,
    pub settings: Vec<BuildSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub path: String,
    pub version: String,
    pub sum: Option<String>,
    pub replace: Option<Box<Module>>,
}

/// One `key=value` pair recorded by `go build` (compiler, GOOS, vcs, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSetting {
    pub key: String,
    pub value: String,
}

impl BuildInfo {
    /// Combine a parsed module info block with the toolchain version from
    /// the header. Returns `None` when neither a `path` line nor a main
    /// module names the source.
    pub fn from_parts(go_version: Option<String>, info: ModInfo) -> Option<Self> {
        let source_path = info
            .path
            .filter(|p| !p.is_empty())
            .or_else(|| info.main.as_ref().map(|m| m.path.clone()))
            .filter(|p| !p.is_empty())?;

        Some(Self {
            source_path,
            go_version: go_version.filter(|v| !v.is_empty()).or(info.go_version),
            main_module: info.main,
            deps: info.deps,
            settings: info.settings,
        })
    }

    /// Version of the main module, e.g. `v1.4.2` or `(devel)`.
    pub fn version(&self) -> Option<&str> {
        self.main_module.as_ref().map(|m| m.version.as_str())
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }
}
