//! rawterm - terminal session engine
//!
//! Module layout:
//! - capability: terminfo search path, resolver, capability lookup
//! - render: serialized capability writes to the output sink
//! - console: raw mode, size, guaranteed restore, termination signals
//! - events: event stream, input/resize producers, shutdown signal
//! - config: settings file and data directories
//! - app: the event loop driving all of the above

pub mod app;
pub mod capability;
pub mod config;
pub mod console;
pub mod events;
pub mod render;
