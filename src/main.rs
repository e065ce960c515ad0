use rawterm::capability::TerminfoEnv;

mod logging;

fn main() {
    let logging = logging::init();
    if let Some(guard) = &logging {
        tracing::debug!(log_dir = %guard.log_dir().display(), "logging to file");
    }

    let settings = rawterm::config::load_settings();
    let code = match rawterm::app::run(settings, TerminfoEnv::from_process()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            eprintln!("rawterm: {}", err);
            1
        }
    };

    // process::exit skips destructors; flush the log writer first.
    drop(logging);
    std::process::exit(code);
}
