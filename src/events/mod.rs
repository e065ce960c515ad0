//! Ordered event stream fed by the resize and input producers.

use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

pub mod decode;
pub mod input;
pub mod resize;
pub mod shutdown;

pub use decode::{decode_input, KeyDecoding, PLACEHOLDER};
pub use resize::{ResizeNotifier, SigwinchNotifier};
pub use shutdown::ShutdownHandle;

use crate::console::{SizeProbe, TerminationSignal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Resize { width: u16, height: u16 },
    Key(char),
    /// Several characters delivered by one read (input methods, escape
    /// sequences).
    MultiKey(String),
    /// Bytes of one read that are not valid UTF-8.
    DecodeError(Vec<u8>),
    /// The input reached end of file; no more keys will arrive.
    InputClosed,
    /// Polling or reading the input failed; the input producer has stopped.
    InputFailed(String),
    Terminate(TerminationSignal),
}

impl Event {
    pub fn is_resize(&self) -> bool {
        matches!(self, Event::Resize { .. })
    }
}

#[derive(Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

/// Consumer side. Each producer's events arrive in emission order; across
/// producers it is first come, first served.
pub struct EventStream {
    rx: Receiver<Event>,
}

pub fn event_channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventStream { rx })
}

impl EventSender {
    /// Returns `false` once the stream has been dropped.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }
}

impl EventStream {
    /// Blocks for the next event. `None` once every sender is gone.
    pub fn next(&self) -> Option<Event> {
        self.rx.recv().ok()
    }

    pub fn try_next(&self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Owns the two producer threads and their shutdown signal.
pub struct EventMultiplexer {
    shutdown: ShutdownHandle,
    producers: Vec<JoinHandle<()>>,
}

impl EventMultiplexer {
    pub fn start<R, N>(
        input: R,
        notifier: N,
        probe: SizeProbe,
        decoding: KeyDecoding,
        events: EventSender,
    ) -> io::Result<Self>
    where
        R: Read + AsRawFd + Send + 'static,
        N: ResizeNotifier,
    {
        let mut mux = Self {
            shutdown: ShutdownHandle::new()?,
            producers: Vec::with_capacity(2),
        };

        mux.producers.push(resize::spawn_resize_producer(
            notifier,
            probe,
            events.clone(),
            mux.shutdown.clone(),
        )?);
        mux.producers.push(input::spawn_input_producer(
            input,
            decoding,
            events,
            mux.shutdown.clone(),
        )?);

        tracing::debug!("event producers started");
        Ok(mux)
    }

    /// Signals both producers and waits for them to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.producers.is_empty() {
            return;
        }
        self.shutdown.trigger();
        for producer in self.producers.drain(..) {
            if producer.join().is_err() {
                tracing::error!("event producer panicked");
            }
        }
    }
}

impl Drop for EventMultiplexer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/events/multiplexer.rs"]
mod tests;
