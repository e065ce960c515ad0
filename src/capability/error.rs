use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures of terminfo resolution.
///
/// `NotInDirectory` is the only continuable variant: the multi-directory
/// search moves on when it sees it. Everything else aborts the search.
#[derive(Debug)]
pub enum ResolveError {
    NotInDirectory {
        name: String,
        directory: PathBuf,
    },
    NotFound {
        name: String,
        directories: Vec<PathBuf>,
    },
    Read {
        path: PathBuf,
        source: io::Error,
    },
    Malformed {
        path: PathBuf,
        reason: String,
    },
    HomeDirectory,
}

impl ResolveError {
    pub fn is_continuable(&self) -> bool {
        matches!(self, ResolveError::NotInDirectory { .. })
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotInDirectory { name, directory } => write!(
                f,
                "could not find terminfo {:?} in {:?}",
                name,
                directory.display().to_string()
            ),
            ResolveError::NotFound { name, directories } => {
                let joined = directories
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "could not find terminfo {:?} in any of {:?}",
                    name, joined
                )
            }
            ResolveError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ResolveError::Malformed { path, reason } => {
                write!(f, "malformed terminfo {}: {}", path.display(), reason)
            }
            ResolveError::HomeDirectory => write!(f, "cannot determine home directory"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}
