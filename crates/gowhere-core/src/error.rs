use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::container::Format;

/// Why a single inspection produced no build information.
///
/// Every variant is terminal for the call; nothing is retried.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file is not an ELF, Mach-O, PE or WebAssembly image.
    #[error("{} is not a recognized executable format", path.display())]
    NotABinary { path: PathBuf },

    /// A recognized image that carries no embedded build information.
    #[error("no embedded build information in {format} image {}", path.display())]
    NoProvenance { path: PathBuf, format: Format },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotABinary { path } | Self::NoProvenance { path, .. } | Self::Io { path, .. } => {
                path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_error_keeps_its_cause() {
        let err = ExtractError::Io {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(err.to_string(), "failed to read /tmp/x");
        assert_eq!(err.source().unwrap().to_string(), "denied");
    }

    #[test]
    fn no_provenance_names_the_format() {
        let err = ExtractError::NoProvenance {
            path: PathBuf::from("/bin/sh"),
            format: Format::Elf,
        };

        assert_eq!(
            err.to_string(),
            "no embedded build information in elf image /bin/sh"
        );
        assert_eq!(err.path(), std::path::Path::new("/bin/sh"));
    }
}
