//! Resolve a command name to an executable on disk.
//!
//! Lookup order: `PATH` entries, then Go workspace binary directories, then
//! the working directory. The first executable match wins.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("{name} not found in any of {}", display_dirs(searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("unable to determine current directory")]
    CurrentDir(#[source] io::Error),
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Directories consulted by [`locate`], captured once so lookups do not
/// depend on process-wide state.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    /// Raw `PATH` value.
    pub path: Option<OsString>,
    /// Workspace binary directories in priority order.
    pub workspace: Vec<PathBuf>,
    pub cwd: PathBuf,
}

impl SearchPaths {
    /// Capture `PATH`, `GOBIN`, `GOPATH` and the working directory.
    pub fn from_env() -> Result<Self, LocateError> {
        let cwd = env::current_dir().map_err(LocateError::CurrentDir)?;
        Ok(Self {
            path: env::var_os("PATH"),
            workspace: workspace_bins(
                env::var_os("GOBIN"),
                env::var_os("GOPATH"),
                dirs::home_dir(),
            ),
            cwd,
        })
    }

    fn path_dirs(&self) -> Vec<PathBuf> {
        self.path
            .as_ref()
            .map(|p| env::split_paths(p).collect())
            .unwrap_or_default()
    }
}

/// Workspace binary directories: `GOBIN` when set, then `<entry>/bin` for
/// every `GOPATH` entry. An unset or empty `GOPATH` means `$HOME/go`.
pub fn workspace_bins(
    gobin: Option<OsString>,
    gopath: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = gobin
        .filter(|g| !g.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .collect();

    match gopath.filter(|g| !g.is_empty()) {
        Some(gopath) => dirs.extend(
            env::split_paths(&gopath)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.join("bin")),
        ),
        None => dirs.extend(home.map(|h| h.join("go").join("bin"))),
    }

    dirs
}

/// Resolve `name` to an executable path.
pub fn locate(name: &str, search: &SearchPaths) -> Result<PathBuf, LocateError> {
    if let Ok(found) = which::which_in(name, search.path.as_ref(), &search.cwd) {
        tracing::debug!(path = %found.display(), "found on PATH");
        return Ok(found);
    }

    for dir in &search.workspace {
        if let Some(found) = lookup_in(name, dir, &search.cwd) {
            tracing::debug!(path = %found.display(), "found in workspace");
            return Ok(found);
        }
    }

    if let Some(found) = lookup_in(name, &search.cwd, &search.cwd) {
        tracing::debug!(path = %found.display(), "found in working directory");
        return Ok(found);
    }

    let mut searched = search.path_dirs();
    searched.extend(search.workspace.iter().cloned());
    searched.push(search.cwd.clone());

    Err(LocateError::NotFound {
        name: name.to_string(),
        searched,
    })
}

fn lookup_in(name: &str, dir: &Path, cwd: &Path) -> Option<PathBuf> {
    which::which_in(name, Some(dir), cwd).ok()
}
