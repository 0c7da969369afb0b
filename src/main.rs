use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGTERM};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&shutdown)) {
            log::warn!(target: "iptsd", "cannot register handler for signal {signal}: {err}");
        }
    }

    match iptsd::daemon::run(&shutdown) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!(target: "iptsd", "{err}");
            ExitCode::FAILURE
        }
    }
}
