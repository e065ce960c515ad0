//! Application lifecycle: `enter → event loop → exit`.

use std::fmt;
use std::io::{self, Write};

use crate::capability::{Capability, ResolveError, Resolver, TerminfoEnv};
use crate::config::Settings;
use crate::console::{install_termination_signals, ConsoleError, ConsoleSession};
use crate::events::{event_channel, Event, EventMultiplexer, EventStream, SigwinchNotifier};
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub enum StartupError {
    MissingTerm,
    Resolve(ResolveError),
    Console(ConsoleError),
    Io(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::MissingTerm => write!(f, "TERM is not set"),
            StartupError::Resolve(err) => write!(f, "{}", err),
            StartupError::Console(err) => write!(f, "{}", err),
            StartupError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::MissingTerm => None,
            StartupError::Resolve(err) => Some(err),
            StartupError::Console(err) => Some(err),
            StartupError::Io(err) => Some(err),
        }
    }
}

impl From<ResolveError> for StartupError {
    fn from(err: ResolveError) -> Self {
        StartupError::Resolve(err)
    }
}

impl From<ConsoleError> for StartupError {
    fn from(err: ConsoleError) -> Self {
        StartupError::Console(err)
    }
}

impl From<io::Error> for StartupError {
    fn from(err: io::Error) -> Self {
        StartupError::Io(err)
    }
}

/// Consumer of the event stream. Owns the renderer and the console session.
pub struct App<W: Write + Send> {
    renderer: Renderer<W>,
    console: ConsoleSession,
    settings: Settings,
    state: AppState,
    size: Option<(u16, u16)>,
    last_input: Option<String>,
    exit_code: i32,
}

impl<W: Write + Send> App<W> {
    pub fn new(renderer: Renderer<W>, console: ConsoleSession, settings: Settings) -> Self {
        Self {
            renderer,
            console,
            settings,
            state: AppState::Stopped,
            size: None,
            last_input: None,
            exit_code: 0,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Last size reported through a `Resize` event.
    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Stopped → Running: raw mode, alternate screen, status view.
    pub fn enter(&mut self) -> Result<(), ConsoleError> {
        if self.state == AppState::Running {
            return Ok(());
        }
        self.console.enter_raw_mode()?;
        self.state = AppState::Running;
        tracing::info!(terminal = self.renderer.terminal_name(), "session started");

        self.write(Capability::EnterAltScreen);
        self.write(Capability::HideCursor);
        self.draw();
        Ok(())
    }

    /// Processes events one at a time, in arrival order, until the quit key.
    pub fn run_loop(&mut self, events: &EventStream) {
        while let Some(event) = events.next() {
            if self.handle_event(event) == Flow::Quit {
                return;
            }
        }
        tracing::warn!("event stream ended");
    }

    pub fn handle_event(&mut self, event: Event) -> Flow {
        tracing::trace!(?event, "event");
        match event {
            Event::Resize { width, height } => {
                self.size = Some((width, height));
            }
            Event::Key(ch) if ch == self.settings.quit_key => {
                tracing::info!("quit key pressed");
                return Flow::Quit;
            }
            Event::Key(ch) => self.last_input = Some(format!("{:?}", ch)),
            Event::MultiKey(text) => self.last_input = Some(format!("{:?}", text)),
            Event::DecodeError(bytes) => {
                self.last_input = Some(format!("undecodable {:02x?}", bytes));
            }
            Event::InputClosed => return Flow::Quit,
            Event::InputFailed(reason) => {
                tracing::error!(%reason, "input lost; stopping");
                self.exit_code = 1;
                return Flow::Quit;
            }
            Event::Terminate(signal) => {
                self.exit_code = signal.exit_code();
                return Flow::Quit;
            }
        }
        self.draw();
        Flow::Continue
    }

    /// Running → Stopped. The alternate screen is left before the console
    /// mode is restored.
    pub fn exit(&mut self) {
        if self.state == AppState::Stopped {
            return;
        }
        self.write(Capability::ShowCursor);
        self.write(Capability::ExitAltScreen);
        if let Err(err) = self.console.restore() {
            tracing::error!(error = %err, "failed to restore console");
        }
        self.state = AppState::Stopped;
        tracing::info!(exit_code = self.exit_code, "session ended");
    }

    fn write(&self, capability: Capability) {
        if let Err(err) = self.renderer.write_capability(capability) {
            tracing::warn!(capability = capability.terminfo_name(), error = %err, "write failed");
        }
    }

    fn draw(&self) {
        if let Err(err) = self.draw_status() {
            tracing::warn!(error = %err, "failed to draw status");
        }
    }

    fn status_lines(&self) -> [String; 3] {
        let size = match self.size {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "size unknown".to_string(),
        };
        [
            format!("rawterm - {} - {}", self.renderer.terminal_name(), size),
            format!(
                "last input: {}",
                self.last_input.as_deref().unwrap_or("none")
            ),
            format!("press {:?} to quit", self.settings.quit_key),
        ]
    }

    fn draw_status(&self) -> io::Result<()> {
        let (width, height) = self.size.unwrap_or((u16::MAX, u16::MAX));
        let lines = self.status_lines();

        let mut scope = self.renderer.scope();
        scope.put(Capability::ClearScreen)?;
        for (row, line) in (0u16..).zip(lines.iter()) {
            if row >= height {
                break;
            }
            if !scope.put(Capability::CursorAddress { row, col: 0 })? && row > 0 {
                scope.text("\r\n")?;
            }
            let clipped: String = line.chars().take(usize::from(width)).collect();
            scope.text(&clipped)?;
        }
        scope.flush()
    }
}

impl<W: Write + Send> Drop for App<W> {
    fn drop(&mut self) {
        self.exit();
    }
}

/// Resolves the terminal, takes over the console and runs until quit.
/// Returns the process exit code.
pub fn run(settings: Settings, env: TerminfoEnv) -> Result<i32, StartupError> {
    if env.term_name().is_empty() {
        return Err(StartupError::MissingTerm);
    }
    let db = Resolver::new(env).load_from_environment()?;

    let console = ConsoleSession::acquire()?;
    console.enter_raw_mode()?;

    let (events, stream) = event_channel();
    let watcher = install_termination_signals(console.restorer(), events.clone())?;
    let mux = EventMultiplexer::start(
        console.input()?,
        SigwinchNotifier::new()?,
        console.size_probe(),
        settings.key_decoding,
        events,
    )?;

    let mut app = App::new(Renderer::new(Box::new(db), io::stdout()), console, settings);
    app.enter()?;
    app.run_loop(&stream);
    app.exit();

    mux.shutdown();
    watcher.close();
    Ok(app.exit_code())
}

#[cfg(test)]
#[path = "../tests/unit/app.rs"]
mod tests;
