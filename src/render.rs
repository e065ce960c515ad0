use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::capability::{Capability, CapabilityDatabase};

/// Writes capability-driven control sequences to a shared sink.
///
/// Every write goes through a [`RenderScope`], which holds the sink lock, so
/// concurrent callers never interleave partial sequences.
pub struct Renderer<W: Write + Send> {
    db: Box<dyn CapabilityDatabase>,
    sink: Mutex<W>,
}

/// Exclusive access to the output sink; released on drop.
pub struct RenderScope<'a, W: Write + Send> {
    db: &'a dyn CapabilityDatabase,
    sink: MutexGuard<'a, W>,
}

impl<W: Write + Send> Renderer<W> {
    pub fn new(db: Box<dyn CapabilityDatabase>, sink: W) -> Self {
        Self {
            db,
            sink: Mutex::new(sink),
        }
    }

    pub fn terminal_name(&self) -> &str {
        self.db.name()
    }

    pub fn scope(&self) -> RenderScope<'_, W> {
        RenderScope {
            db: &*self.db,
            sink: self.sink.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Writes one capability and flushes. Returns `false` when the terminal
    /// lacks it.
    pub fn write_capability(&self, capability: Capability) -> io::Result<bool> {
        let mut scope = self.scope();
        let written = scope.put(capability)?;
        if written {
            scope.flush()?;
        }
        Ok(written)
    }

    pub fn enter_full_screen(&self) -> io::Result<bool> {
        self.write_capability(Capability::EnterAltScreen)
    }

    pub fn exit_full_screen(&self) -> io::Result<bool> {
        self.write_capability(Capability::ExitAltScreen)
    }

    pub fn move_cursor(&self, row: u16, col: u16) -> io::Result<bool> {
        self.write_capability(Capability::CursorAddress { row, col })
    }
}

impl<W: Write + Send> RenderScope<'_, W> {
    pub fn put(&mut self, capability: Capability) -> io::Result<bool> {
        match self.db.expand(capability) {
            Some(bytes) => {
                self.sink.write_all(&bytes)?;
                Ok(true)
            }
            None => {
                tracing::trace!(
                    capability = capability.terminfo_name(),
                    "capability not supported"
                );
                Ok(false)
            }
        }
    }

    pub fn text(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
#[path = "../tests/unit/render.rs"]
mod tests;
