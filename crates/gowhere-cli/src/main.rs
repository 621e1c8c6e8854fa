use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use gowhere_core::report::{model::ToolInfo, render};
use gowhere_core::{ExtractConfig, ExtractError, SearchPaths, inspect, locate};

mod args;

use args::{Config, Invocation, OutputFormat};

/// Always exits 0: lookup and extraction failures are reported on stderr
/// only, so scripts can treat "not a Go binary" as an ordinary answer.
fn main() -> Result<()> {
    init_tracing();

    let argv: Vec<_> = std::env::args_os().collect();
    let program = argv
        .first()
        .and_then(|p| Path::new(p).file_name())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| gowhere_core::TOOL_NAME.to_string());

    match Config::from_args(argv) {
        Invocation::Usage => {
            print!("{}", args::usage(&program));
            Ok(())
        }
        Invocation::Run(config) => run(&config, &mut io::stdout().lock(), &mut io::stderr().lock()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(config: &Config, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    let name = &config.command;

    let path = match SearchPaths::from_env().and_then(|search| locate(name, &search)) {
        Ok(path) => path,
        Err(e) => {
            writeln!(err, "{name}: command not found")?;
            if config.verbose {
                writeln!(err, "{:?}", anyhow::Error::new(e))?;
            }
            return Ok(());
        }
    };

    let tool = ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let report = match inspect(&path, tool, &ExtractConfig::default()) {
        Ok(report) => report,
        Err(e) => {
            writeln!(err, "{}", diagnostic(name, &e))?;
            if config.verbose {
                writeln!(err, "{:?}", anyhow::Error::new(e))?;
            }
            return Ok(());
        }
    };

    match config.format {
        OutputFormat::Path => writeln!(out, "{}", report.build.source_path)?,
        OutputFormat::Text => write!(out, "{}", render::render_text(&report))?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
    }

    Ok(())
}

/// One-line message for an extraction failure.
fn diagnostic(name: &str, e: &ExtractError) -> String {
    let path = e.path().display();
    match e {
        ExtractError::NoProvenance { .. } => {
            format!("No source path in {path} - {name} is perhaps not a Go binary")
        }
        ExtractError::NotABinary { .. } => format!(
            "{path} is not a recognized executable format - {name} is perhaps not a Go binary"
        ),
        ExtractError::Io { .. } => format!("failed to read {path}"),
    }
}
