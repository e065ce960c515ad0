//! Controlling-terminal session: raw mode, size, and guaranteed restore.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod signals;

pub use signals::{install_termination_signals, TerminationSignal, TerminationWatcher};

const CONTROLLING_TTY: &str = "/dev/tty";

/// OS primitive that flips the terminal between cooked and raw mode.
pub trait ConsoleOps: Send + Sync + 'static {
    fn enter_raw(&self) -> io::Result<()>;
    fn restore(&self) -> io::Result<()>;
    fn size(&self) -> io::Result<(u16, u16)>;
}

#[derive(Debug, Default)]
pub struct CrosstermConsoleOps;

impl ConsoleOps for CrosstermConsoleOps {
    fn enter_raw(&self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn restore(&self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    Cooked,
    Raw,
}

#[derive(Debug)]
pub enum ConsoleError {
    NoTerminal(io::Error),
    RawMode(io::Error),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::NoTerminal(err) => {
                write!(f, "no controlling terminal available: {}", err)
            }
            ConsoleError::RawMode(err) => write!(f, "failed to enter raw mode: {}", err),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::NoTerminal(err) | ConsoleError::RawMode(err) => Some(err),
        }
    }
}

/// Restores the console from any thread. Only the first call after raw mode
/// was entered reaches the OS.
#[derive(Clone)]
pub struct ConsoleRestorer {
    raw: Arc<AtomicBool>,
    ops: Arc<dyn ConsoleOps>,
}

impl ConsoleRestorer {
    pub fn restore(&self) -> io::Result<()> {
        if !self.raw.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("restoring console mode");
        self.ops.restore()
    }
}

/// Reads the current terminal size; handed to the resize producer.
#[derive(Clone)]
pub struct SizeProbe {
    ops: Arc<dyn ConsoleOps>,
}

impl SizeProbe {
    pub fn size(&self) -> io::Result<(u16, u16)> {
        self.ops.size()
    }
}

/// Exclusive handle on the controlling terminal.
///
/// Dropping the session restores the original mode, so every exit path
/// (early return, `?`, unwinding panic) leaves the terminal usable.
pub struct ConsoleSession {
    tty: Option<File>,
    restorer: ConsoleRestorer,
}

impl ConsoleSession {
    pub fn acquire() -> Result<Self, ConsoleError> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open(CONTROLLING_TTY)
            .map_err(ConsoleError::NoTerminal)?;
        let mut session = Self::with_ops(Arc::new(CrosstermConsoleOps));
        session.tty = Some(tty);
        Ok(session)
    }

    /// Session over custom ops and no tty handle.
    pub fn with_ops(ops: Arc<dyn ConsoleOps>) -> Self {
        Self {
            tty: None,
            restorer: ConsoleRestorer {
                raw: Arc::new(AtomicBool::new(false)),
                ops,
            },
        }
    }

    pub fn enter_raw_mode(&self) -> Result<(), ConsoleError> {
        if self.restorer.raw.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.restorer.ops.enter_raw().map_err(ConsoleError::RawMode)?;
        self.restorer.raw.store(true, Ordering::SeqCst);
        tracing::debug!("console in raw mode");
        Ok(())
    }

    pub fn restore(&self) -> io::Result<()> {
        self.restorer.restore()
    }

    pub fn mode(&self) -> ConsoleMode {
        if self.restorer.raw.load(Ordering::SeqCst) {
            ConsoleMode::Raw
        } else {
            ConsoleMode::Cooked
        }
    }

    pub fn size(&self) -> io::Result<(u16, u16)> {
        self.restorer.ops.size()
    }

    pub fn size_probe(&self) -> SizeProbe {
        SizeProbe {
            ops: Arc::clone(&self.restorer.ops),
        }
    }

    pub fn restorer(&self) -> ConsoleRestorer {
        self.restorer.clone()
    }

    /// A fresh handle on the terminal for the input producer.
    pub fn input(&self) -> io::Result<File> {
        match &self.tty {
            Some(tty) => tty.try_clone(),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "console session has no terminal handle",
            )),
        }
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        if let Err(err) = self.restorer.restore() {
            tracing::warn!(error = %err, "failed to restore console on drop");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/console/session.rs"]
mod tests;
