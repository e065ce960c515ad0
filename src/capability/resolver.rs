use std::io;
use std::path::{Path, PathBuf};

use super::database::{DatabaseLoader, TerminfoLoader};
use super::error::ResolveError;
use super::search_path::{SearchPath, TerminfoEnv};

/// Locates a terminal's capability database across the terminfo search path.
pub struct Resolver<L = TerminfoLoader> {
    loader: L,
    env: TerminfoEnv,
}

impl Resolver<TerminfoLoader> {
    pub fn new(env: TerminfoEnv) -> Self {
        Self::with_loader(TerminfoLoader, env)
    }
}

impl<L: DatabaseLoader> Resolver<L> {
    pub fn with_loader(loader: L, env: TerminfoEnv) -> Self {
        Self { loader, env }
    }

    /// Parses `path`. Read and parse failures are both fatal.
    pub fn load_from_file(&self, path: &Path) -> Result<L::Database, ResolveError> {
        tracing::debug!(path = %path.display(), "loading terminfo file");
        self.loader.load(path)
    }

    /// Tries `dir/name`, then `dir/<first char>/name`.
    pub fn load_from_directory(&self, dir: &Path, name: &str) -> Result<L::Database, ResolveError> {
        let root = dir.join(name);
        match std::fs::metadata(&root) {
            Ok(_) => return self.load_from_file(&root),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if let Some(nested) = nested_path(dir, name) {
                    if std::fs::metadata(&nested).is_ok() {
                        return self.load_from_file(&nested);
                    }
                }
            }
            Err(err) => {
                tracing::debug!(path = %root.display(), error = %err, "terminfo path not accessible");
            }
        }

        Err(ResolveError::NotInDirectory {
            name: name.to_string(),
            directory: dir.to_path_buf(),
        })
    }

    pub fn load_from_name(&self, name: &str) -> Result<L::Database, ResolveError> {
        let search_path = SearchPath::from_env(&self.env).ok_or(ResolveError::HomeDirectory)?;
        self.load_from_search_path(name, search_path)
    }

    /// First directory holding `name` wins; a fatal error stops the search.
    pub fn load_from_search_path(
        &self,
        name: &str,
        search_path: SearchPath,
    ) -> Result<L::Database, ResolveError> {
        for dir in search_path.dirs() {
            match self.load_from_directory(dir, name) {
                Ok(db) => {
                    tracing::info!(name, dir = %dir.display(), "terminfo resolved");
                    return Ok(db);
                }
                Err(err) if err.is_continuable() => continue,
                Err(err) => return Err(err),
            }
        }

        Err(ResolveError::NotFound {
            name: name.to_string(),
            directories: search_path.into_dirs(),
        })
    }

    /// Resolves the terminal named by `$TERM`.
    pub fn load_from_environment(&self) -> Result<L::Database, ResolveError> {
        let name = self.env.term_name();
        self.load_from_name(&name)
    }
}

fn nested_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let first = name.chars().next()?;
    Some(dir.join(first.to_string()).join(name))
}

#[cfg(test)]
#[path = "../../tests/unit/capability/resolver.rs"]
mod tests;
