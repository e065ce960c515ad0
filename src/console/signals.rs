use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use super::ConsoleRestorer;
use crate::events::{Event, EventSender};

const GRACE_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    SigHup,
    SigInt,
    SigTerm,
}

impl TerminationSignal {
    fn from_raw(sig: i32) -> Option<Self> {
        match sig {
            SIGHUP => Some(TerminationSignal::SigHup),
            SIGINT => Some(TerminationSignal::SigInt),
            SIGTERM => Some(TerminationSignal::SigTerm),
            _ => None,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            TerminationSignal::SigHup => 129,
            TerminationSignal::SigInt => 130,
            TerminationSignal::SigTerm => 143,
        }
    }
}

/// Background thread turning termination signals into `Event::Terminate`.
///
/// If the application has not closed the watcher within the grace period
/// after a signal, the watcher restores the console and exits the process.
pub struct TerminationWatcher {
    handle: Handle,
    done: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TerminationWatcher {
    /// Stops watching and joins the thread. Dropping the watcher does the
    /// same; the teardown lives in `Drop`.
    pub fn close(self) {}
}

impl Drop for TerminationWatcher {
    fn drop(&mut self) {
        self.done.take();
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn install_termination_signals(
    restorer: ConsoleRestorer,
    events: EventSender,
) -> io::Result<TerminationWatcher> {
    let mut signals = Signals::new([SIGHUP, SIGINT, SIGTERM])?;
    let handle = signals.handle();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let thread = thread::Builder::new()
        .name("rawterm-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(signal) = TerminationSignal::from_raw(sig) else {
                    continue;
                };
                tracing::info!(?signal, "termination signal received");
                events.send(Event::Terminate(signal));

                // Grace period: if the main loop is wedged, restore + hard-exit.
                match done_rx.recv_timeout(GRACE_PERIOD) {
                    Err(RecvTimeoutError::Timeout) => {
                        tracing::warn!(?signal, "shutdown timed out; forcing exit");
                        let _ = restorer.restore();
                        std::process::exit(signal.exit_code());
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        })?;

    Ok(TerminationWatcher {
        handle,
        done: Some(done_tx),
        thread: Some(thread),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/console/signals.rs"]
mod tests;
