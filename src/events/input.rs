use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::thread::{self, JoinHandle};

use super::decode::{decode_input, KeyDecoding};
use super::shutdown::ShutdownHandle;
use super::{Event, EventSender};

const READ_BUF: usize = 256;

enum Readiness {
    Input,
    Shutdown,
}

/// Spawns the input producer: one blocking read per wakeup, decoded into a
/// single event.
pub fn spawn_input_producer<R>(
    input: R,
    decoding: KeyDecoding,
    events: EventSender,
    shutdown: ShutdownHandle,
) -> io::Result<JoinHandle<()>>
where
    R: Read + AsRawFd + Send + 'static,
{
    thread::Builder::new()
        .name("rawterm-input".to_string())
        .spawn(move || run_input(input, decoding, events, shutdown))
}

fn run_input<R: Read + AsRawFd>(
    mut input: R,
    decoding: KeyDecoding,
    events: EventSender,
    shutdown: ShutdownHandle,
) {
    let mut buf = [0u8; READ_BUF];
    loop {
        match wait_readable(input.as_raw_fd(), shutdown.wake_fd()) {
            Ok(Readiness::Input) => {}
            Ok(Readiness::Shutdown) => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::error!(error = %err, "polling input failed");
                events.send(Event::InputFailed(err.to_string()));
                break;
            }
        }

        let n = match input.read(&mut buf) {
            Ok(0) => {
                tracing::info!("input closed");
                events.send(Event::InputClosed);
                break;
            }
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                continue
            }
            Err(err) => {
                tracing::error!(error = %err, "reading input failed");
                events.send(Event::InputFailed(err.to_string()));
                break;
            }
        };

        let Some(event) = decode_input(&buf[..n], decoding) else {
            continue;
        };
        if !events.send(event) {
            break;
        }
    }
    tracing::debug!("input producer stopped");
}

/// Blocks until either the input or the shutdown pipe is readable. Shutdown
/// wins when both are.
fn wait_readable(input_fd: RawFd, wake_fd: RawFd) -> io::Result<Readiness> {
    loop {
        let mut fds = [
            libc::pollfd {
                fd: input_fd,
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: wake_fd,
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        // SAFETY: fds is a valid array of pollfd for the duration of the call.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        if fds[1].revents != 0 {
            return Ok(Readiness::Shutdown);
        }
        if fds[0].revents != 0 {
            return Ok(Readiness::Input);
        }
    }
}
