use std::path::Path;

use terminfo::capability as cap;

use super::error::ResolveError;

/// Terminal features the renderer knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    EnterAltScreen,
    ExitAltScreen,
    CursorAddress { row: u16, col: u16 },
    ClearScreen,
    HideCursor,
    ShowCursor,
}

impl Capability {
    /// Short terminfo name (`smcup`, `cup`, ...).
    pub fn terminfo_name(self) -> &'static str {
        match self {
            Capability::EnterAltScreen => "smcup",
            Capability::ExitAltScreen => "rmcup",
            Capability::CursorAddress { .. } => "cup",
            Capability::ClearScreen => "clear",
            Capability::HideCursor => "civis",
            Capability::ShowCursor => "cnorm",
        }
    }
}

/// Immutable lookup service from capability to output-ready bytes.
///
/// `None` means the terminal lacks the capability; that is never an error.
pub trait CapabilityDatabase: Send + Sync {
    fn name(&self) -> &str;

    fn expand(&self, capability: Capability) -> Option<Vec<u8>>;
}

/// Parses one database file. The resolver is generic over this so the search
/// order can be exercised without real terminfo files.
pub trait DatabaseLoader {
    type Database;

    fn load(&self, path: &Path) -> Result<Self::Database, ResolveError>;
}

/// Compiled terminfo entry parsed by the `terminfo` crate.
pub struct TerminfoDatabase {
    inner: terminfo::Database,
}

impl TerminfoDatabase {
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, ResolveError> {
        terminfo::Database::from_buffer(bytes)
            .map(|inner| Self { inner })
            .map_err(|err| ResolveError::Malformed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })
    }
}

impl CapabilityDatabase for TerminfoDatabase {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn expand(&self, capability: Capability) -> Option<Vec<u8>> {
        let db = &self.inner;
        let expanded = match capability {
            Capability::EnterAltScreen => db.get::<cap::EnterCaMode>()?.expand().to_vec(),
            Capability::ExitAltScreen => db.get::<cap::ExitCaMode>()?.expand().to_vec(),
            Capability::CursorAddress { row, col } => db
                .get::<cap::CursorAddress>()?
                .expand()
                .parameters(u32::from(row), u32::from(col))
                .to_vec(),
            Capability::ClearScreen => db.get::<cap::ClearScreen>()?.expand().to_vec(),
            Capability::HideCursor => db.get::<cap::CursorInvisible>()?.expand().to_vec(),
            Capability::ShowCursor => db.get::<cap::CursorNormal>()?.expand().to_vec(),
        };

        match expanded {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(
                    capability = capability.terminfo_name(),
                    error = %err,
                    "capability expansion failed"
                );
                None
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminfoLoader;

impl DatabaseLoader for TerminfoLoader {
    type Database = TerminfoDatabase;

    fn load(&self, path: &Path) -> Result<TerminfoDatabase, ResolveError> {
        let bytes = std::fs::read(path).map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        TerminfoDatabase::from_bytes(path, &bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capability/database.rs"]
mod tests;
