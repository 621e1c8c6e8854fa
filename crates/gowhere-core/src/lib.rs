pub mod artifact;
pub mod buildinfo;
pub mod container;
pub mod error;
pub mod extract;
pub mod locate;
pub mod report;

use std::path::Path;

pub use buildinfo::model::{BuildInfo, BuildSetting, Module};
pub use error::ExtractError;
pub use extract::{ExtractConfig, Extraction, LocatedBy, Miss, extract, extract_bytes, extract_with};
pub use locate::{LocateError, SearchPaths, locate};

use crate::report::model::{Report, ToolInfo};

pub const TOOL_NAME: &str = "gowhere";

/// JSON schema version of gowhere reports.
/// Bump only when the report layout changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Read the executable at `path`, extract its build provenance and assemble
/// the JSON-facing report.
pub fn inspect(path: &Path, tool: ToolInfo, config: &ExtractConfig) -> Result<Report, ExtractError> {
    let artifact = artifact::read_artifact(path)?;
    let extraction = extract_bytes(&artifact.bytes, config).map_err(|miss| miss.at(path))?;
    Ok(Report::new(tool, artifact.into_artifact(), extraction))
}
