use std::ffi::OsString;

use clap::{CommandFactory, Parser, ValueEnum};

pub const ABOUT: &str = "Prints the source package a Go executable was built from";

/// Arguments that print usage instead of running.
pub const HELP_ALIASES: &[&str] = &["help", "-h", "-help", "--help", "-?"];

#[derive(Debug, Parser)]
#[command(name = "gowhere", about = ABOUT, disable_help_flag = true)]
struct Args {
    /// Executable name, looked up in PATH, the Go workspace bin directories
    /// and the current directory
    command: String,

    /// Verbose error output
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "path")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Source package path only
    Path,
    /// Summary of the embedded build information
    Text,
    /// Full JSON report
    Json,
}

/// Settings for one run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: String,
    pub verbose: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    Usage,
}

impl Config {
    /// Interpret a full argument vector (program name first).
    ///
    /// Help aliases, a missing command and anything clap rejects all ask
    /// for usage text.
    pub fn from_args<I, T>(args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        let wants_help = args
            .iter()
            .skip(1)
            .any(|a| a.to_str().is_some_and(|a| HELP_ALIASES.contains(&a)));
        if wants_help {
            return Invocation::Usage;
        }

        match Args::try_parse_from(&args) {
            Ok(args) => Invocation::Run(Config {
                command: args.command,
                verbose: args.verbose,
                format: args.format,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "unusable arguments");
                Invocation::Usage
            }
        }
    }
}

/// Usage text for `program`, derived from the argument definitions.
pub fn usage(program: &str) -> String {
    let mut cmd = Args::command().bin_name(program.to_string());
    format!(
        "{}\nHelp: {} [{}]\n",
        cmd.render_help(),
        program,
        HELP_ALIASES.join(" | ")
    )
}
