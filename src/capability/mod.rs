//! Terminal capability database lookup.
//!
//! The search follows the usual terminfo layout: `$TERMINFO`,
//! `~/.terminfo`, `$TERMINFO_DIRS`, then the system directories. Parsing the
//! compiled format is delegated to the `terminfo` crate.

pub mod database;
pub mod error;
pub mod resolver;
pub mod search_path;

pub use database::{
    Capability, CapabilityDatabase, DatabaseLoader, TerminfoDatabase, TerminfoLoader,
};
pub use error::ResolveError;
pub use resolver::Resolver;
pub use search_path::{SearchPath, TerminfoEnv};
