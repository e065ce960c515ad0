use std::io;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::Signals;

use super::shutdown::ShutdownHandle;
use super::{Event, EventSender};
use crate::console::SizeProbe;

/// Source of "terminal size changed" notifications.
pub trait ResizeNotifier: Send + 'static {
    /// Blocks until the next notification. Returns `false` once closed.
    fn wait(&mut self) -> bool;

    /// Returns a callback that makes a pending `wait` return `false`.
    fn closer(&self) -> Box<dyn FnOnce() + Send>;
}

/// `SIGWINCH` delivered through `signal-hook`.
pub struct SigwinchNotifier {
    signals: Signals,
}

impl SigwinchNotifier {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            signals: Signals::new([SIGWINCH])?,
        })
    }
}

impl ResizeNotifier for SigwinchNotifier {
    fn wait(&mut self) -> bool {
        self.signals.forever().next().is_some()
    }

    fn closer(&self) -> Box<dyn FnOnce() + Send> {
        let handle = self.signals.handle();
        Box::new(move || handle.close())
    }
}

/// Spawns the resize producer. It reports the current size right away, then
/// once per notification.
pub fn spawn_resize_producer<N: ResizeNotifier>(
    notifier: N,
    probe: SizeProbe,
    events: EventSender,
    shutdown: ShutdownHandle,
) -> io::Result<JoinHandle<()>> {
    shutdown.on_trigger(notifier.closer());
    thread::Builder::new()
        .name("rawterm-resize".to_string())
        .spawn(move || run_resize(notifier, probe, events, shutdown))
}

fn run_resize<N: ResizeNotifier>(
    mut notifier: N,
    probe: SizeProbe,
    events: EventSender,
    shutdown: ShutdownHandle,
) {
    if emit_size(&probe, &events) {
        while notifier.wait() {
            if shutdown.is_triggered() || !emit_size(&probe, &events) {
                break;
            }
        }
    }
    tracing::debug!("resize producer stopped");
}

/// Returns `false` once the stream is gone.
fn emit_size(probe: &SizeProbe, events: &EventSender) -> bool {
    match probe.size() {
        Ok((width, height)) => {
            tracing::debug!(width, height, "terminal size");
            events.send(Event::Resize { width, height })
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to query terminal size");
            true
        }
    }
}
