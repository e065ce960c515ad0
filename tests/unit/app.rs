use super::*;
use crate::console::{ConsoleOps, TerminationSignal};
use crate::testsupport::{SharedSink, StaticDatabase, CLEAR, RMCUP, SMCUP};
use std::sync::{Arc, Mutex};

struct JournalOps {
    journal: Arc<Mutex<Vec<String>>>,
}

impl ConsoleOps for JournalOps {
    fn enter_raw(&self) -> io::Result<()> {
        self.journal.lock().unwrap().push("raw".to_string());
        Ok(())
    }

    fn restore(&self) -> io::Result<()> {
        self.journal.lock().unwrap().push("restore".to_string());
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((80, 24))
    }
}

struct Fixture {
    app: App<SharedSink>,
    sink: SharedSink,
    journal: Arc<Mutex<Vec<String>>>,
}

fn fixture(settings: Settings) -> Fixture {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let sink = SharedSink::with_journal(Arc::clone(&journal));
    let console = ConsoleSession::with_ops(Arc::new(JournalOps {
        journal: Arc::clone(&journal),
    }));
    let renderer = Renderer::new(Box::new(StaticDatabase::xterm()), sink.clone());
    Fixture {
        app: App::new(renderer, console, settings),
        sink,
        journal,
    }
}

fn position(journal: &[String], entry: &str) -> usize {
    journal
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry:?} not in {journal:?}"))
}

#[test]
fn enter_switches_to_raw_mode_then_alternate_screen() {
    let mut f = fixture(Settings::default());
    assert_eq!(f.app.state(), AppState::Stopped);

    f.app.enter().unwrap();

    assert_eq!(f.app.state(), AppState::Running);
    let journal = f.journal.lock().unwrap().clone();
    assert_eq!(journal[0], "raw");
    assert_eq!(journal[1], format!("write:{SMCUP}"));
    assert!(f.sink.contents().starts_with(&format!("{SMCUP}{CLEAR}")));
}

#[test]
fn quit_key_stops_the_loop_in_arrival_order() {
    let mut f = fixture(Settings::default());
    let (tx, stream) = event_channel();
    tx.send(Event::Resize {
        width: 100,
        height: 30,
    });
    tx.send(Event::Key('q'));
    tx.send(Event::Resize {
        width: 1,
        height: 1,
    });

    f.app.enter().unwrap();
    f.app.run_loop(&stream);

    assert_eq!(f.app.size(), Some((100, 30)));
    assert_eq!(
        stream.try_next(),
        Some(Event::Resize {
            width: 1,
            height: 1
        })
    );
    assert_eq!(f.app.state(), AppState::Running);
}

#[test]
fn exit_leaves_alternate_screen_before_restoring_console() {
    let mut f = fixture(Settings::default());
    f.app.enter().unwrap();
    f.app.exit();

    assert_eq!(f.app.state(), AppState::Stopped);
    let journal = f.journal.lock().unwrap().clone();
    assert!(position(&journal, &format!("write:{RMCUP}")) < position(&journal, "restore"));
    assert_eq!(journal.iter().filter(|e| *e == "restore").count(), 1);
}

#[test]
fn dropping_a_running_app_still_exits_cleanly() {
    let f = fixture(Settings::default());
    let Fixture {
        mut app, journal, ..
    } = f;
    app.enter().unwrap();
    drop(app);

    let journal = journal.lock().unwrap().clone();
    assert!(position(&journal, &format!("write:{RMCUP}")) < position(&journal, "restore"));
}

#[test]
fn exit_without_enter_writes_nothing() {
    let mut f = fixture(Settings::default());
    f.app.exit();
    drop(f.app);

    assert!(f.journal.lock().unwrap().is_empty());
    assert!(f.sink.contents().is_empty());
}

#[test]
fn other_input_keeps_running_and_is_shown() {
    let mut f = fixture(Settings::default());
    f.app.enter().unwrap();

    assert_eq!(f.app.handle_event(Event::Key('x')), Flow::Continue);
    assert!(f.sink.contents().contains("last input: 'x'"));

    assert_eq!(
        f.app.handle_event(Event::MultiKey("\x1b[A".to_string())),
        Flow::Continue
    );
    assert_eq!(
        f.app.handle_event(Event::DecodeError(vec![0xff])),
        Flow::Continue
    );
    assert!(f.sink.contents().contains("undecodable [ff]"));
}

#[test]
fn custom_quit_key_is_honoured() {
    let mut f = fixture(Settings {
        quit_key: 'x',
        ..Settings::default()
    });
    assert_eq!(f.app.handle_event(Event::Key('q')), Flow::Continue);
    assert_eq!(f.app.handle_event(Event::Key('x')), Flow::Quit);
}

#[test]
fn termination_signal_quits_with_signal_exit_code() {
    let mut f = fixture(Settings::default());
    assert_eq!(
        f.app
            .handle_event(Event::Terminate(TerminationSignal::SigTerm)),
        Flow::Quit
    );
    assert_eq!(f.app.exit_code(), 143);
}

#[test]
fn closed_input_quits() {
    let mut f = fixture(Settings::default());
    assert_eq!(f.app.handle_event(Event::InputClosed), Flow::Quit);
    assert_eq!(f.app.exit_code(), 0);
}

#[test]
fn lost_input_quits_with_failure_code() {
    let mut f = fixture(Settings::default());
    f.app.enter().unwrap();
    assert_eq!(
        f.app.handle_event(Event::InputFailed("EIO".to_string())),
        Flow::Quit
    );
    assert_eq!(f.app.exit_code(), 1);

    f.app.exit();
    let journal = f.journal.lock().unwrap().clone();
    assert!(position(&journal, &format!("write:{RMCUP}")) < position(&journal, "restore"));
}

#[test]
fn status_view_is_clipped_to_the_reported_size() {
    let mut f = fixture(Settings::default());
    f.app.handle_event(Event::Resize {
        width: 7,
        height: 2,
    });

    let out = f.sink.contents();
    assert!(out.contains("\x1b[1;1Hrawterm"));
    assert!(out.contains("\x1b[2;1Hlast in"));
    assert!(!out.contains("\x1b[3;1H"));
    assert!(!out.contains("rawterm -"));
}

#[test]
fn missing_term_is_rejected_before_touching_the_terminal() {
    let env = TerminfoEnv {
        home: Some("/home/x".into()),
        ..TerminfoEnv::default()
    };
    let err = run(Settings::default(), env).unwrap_err();
    assert!(matches!(err, StartupError::MissingTerm));
}

#[test]
fn unresolvable_terminal_fails_with_directory_list() {
    let env = TerminfoEnv {
        term: Some("rawterm-no-such-terminal".into()),
        home: Some("/home/x".into()),
        ..TerminfoEnv::default()
    };
    let err = run(Settings::default(), env).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("/home/x/.terminfo"));
    assert!(message.contains("/usr/share/terminfo"));
}
