//! Latched shutdown signal observed by the event producers.
//!
//! Backed by a self-pipe: triggering writes one byte that is never drained,
//! so a producer blocked in `libc::poll()` on the read end wakes up and every
//! later poll returns immediately. Producers blocked elsewhere (the signal
//! iterator) register a hook that unblocks them.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Hook = Box<dyn FnOnce() + Send>;

struct Inner {
    triggered: AtomicBool,
    read_end: OwnedFd,
    write_end: OwnedFd,
    hooks: Mutex<Vec<Hook>>,
}

/// Cloneable handle; any clone can trigger, every clone observes.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

impl ShutdownHandle {
    pub fn new() -> io::Result<Self> {
        let (read_end, write_end) = nonblocking_pipe()?;
        Ok(Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                read_end,
                write_end,
                hooks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Raises the signal. Only the first call has any effect.
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("shutdown requested");

        // SAFETY: write_end is a valid pipe fd owned by `inner`; buf is 1 byte.
        let written =
            unsafe { libc::write(self.inner.write_end.as_raw_fd(), [1u8].as_ptr().cast(), 1) };
        if written != 1 {
            tracing::error!(
                error = %io::Error::last_os_error(),
                "failed to wake producers; input may stay parked"
            );
        }

        let hooks = std::mem::take(
            &mut *self
                .inner
                .hooks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for hook in hooks {
            hook();
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Read end of the wakeup pipe, readable once triggered.
    pub fn wake_fd(&self) -> RawFd {
        self.inner.read_end.as_raw_fd()
    }

    /// Runs `hook` on trigger, or right away if already triggered.
    pub fn on_trigger(&self, hook: impl FnOnce() + Send + 'static) {
        let mut hooks = self
            .inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_triggered() {
            drop(hooks);
            hook();
            return;
        }
        hooks.push(Box::new(hook));
    }
}

fn nonblocking_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as RawFd; 2];
    // SAFETY: fds is a valid 2-element array.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: both fds were just returned by pipe() and are owned by nobody else.
    let (read_end, write_end) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    for fd in [&read_end, &write_end] {
        // SAFETY: fd is a valid open descriptor.
        unsafe {
            let flags = libc::fcntl(fd.as_raw_fd(), libc::F_GETFL);
            if flags == -1 {
                return Err(io::Error::last_os_error());
            }
            if libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) == -1 {
                return Err(io::Error::last_os_error());
            }
        }
    }

    Ok((read_end, write_end))
}

#[cfg(test)]
#[path = "../../tests/unit/events/shutdown.rs"]
mod tests;
