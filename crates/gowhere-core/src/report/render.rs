use crate::TOOL_NAME;
use crate::report::model::Report;

/// Human-readable multi-line summary of a report.
pub fn render_text(report: &Report) -> String {
    let build = &report.build;
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    if let Some(path) = &report.artifact.path {
        out.push_str(&format!("Executable: {path}\n"));
    }
    out.push_str(&format!(
        "Format: {} (found by {})\n",
        report.format, report.located_by
    ));
    out.push_str(&format!("Source: {}\n", build.source_path));
    if let Some(module) = &build.main_module {
        out.push_str(&format!("Module: {} {}\n", module.path, module.version));
    }
    if let Some(go) = &build.go_version {
        out.push_str(&format!("Go: {go}\n"));
    }
    if !build.deps.is_empty() {
        out.push_str("Dependencies:\n");
        for dep in &build.deps {
            out.push_str(&format!("  - {} {}\n", dep.path, dep.version));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::tests::sample_report;

    #[test]
    fn text_lists_source_and_module() {
        let text = render_text(&sample_report());

        assert!(text.starts_with("gowhere 0.1.0\n"));
        assert!(text.contains("Source: example.org/org/tool\n"));
        assert!(text.contains("Module: example.org/org/tool v1.4.2\n"));
        assert!(text.contains("Format: elf (found by section)\n"));
        assert!(!text.contains("Dependencies:"));
    }
}
