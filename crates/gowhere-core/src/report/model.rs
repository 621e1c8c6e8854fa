use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::buildinfo::model::BuildInfo;
use crate::container::Format;
use crate::extract::{Extraction, LocatedBy};

/// JSON report for one inspected executable.
///
/// Deterministic for identical input bytes apart from `artifact.path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub artifact: ArtifactInfo,
    pub format: Format,
    pub located_by: LocatedBy,
    pub build: BuildInfo,
}

impl Report {
    pub fn new(tool: ToolInfo, artifact: ArtifactInfo, extraction: Extraction) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            artifact,
            format: extraction.format,
            located_by: extraction.located_by,
            build: extraction.info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub path: Option<String>,
    pub size_bytes: u64,
    pub hash: ArtifactHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub value: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::buildinfo::model::Module;

    pub(crate) fn sample_report() -> Report {
        Report::new(
            ToolInfo {
                name: "gowhere".into(),
                version: "0.1.0".into(),
            },
            ArtifactInfo {
                path: Some("/usr/local/bin/tool".into()),
                size_bytes: 123,
                hash: ArtifactHash {
                    algorithm: "sha256".into(),
                    value: "abc".into(),
                },
            },
            Extraction {
                format: Format::Elf,
                located_by: LocatedBy::Section,
                info: BuildInfo {
                    source_path: "example.org/org/tool".into(),
                    go_version: Some("go1.22.1".into()),
                    main_module: Some(Module {
                        path: "example.org/org/tool".into(),
                        version: "v1.4.2".into(),
                        sum: None,
                        replace: None,
                    }),
                    deps: vec![],
                    settings: vec![],
                },
            },
        )
    }

    #[test]
    fn report_serializes_expected_shape() {
        let json = serde_json::to_value(sample_report()).unwrap();

        assert_eq!(json["schema_version"], "0.1.0");
        assert_eq!(json["format"], "elf");
        assert_eq!(json["located_by"], "section");
        assert_eq!(json["build"]["source_path"], "example.org/org/tool");
        assert_eq!(json["build"]["main_module"]["version"], "v1.4.2");
        assert!(json["build"]["deps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = sample_report();
        let text = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&text).unwrap();

        assert_eq!(back.build, report.build);
        assert_eq!(back.format, Format::Elf);
    }
}
