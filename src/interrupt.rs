//! Forced dry-run teardown on termination signals.
//!
//! Normal completion and error paths both run `leave_rehearsal`, but an
//! external termination signal bypasses function returns entirely. While
//! dry-run redirection is active a watcher task polls for signals and
//! forces restoration before the process exits.

use crate::goenv::{EnvironmentPort, GoPaths};
use crate::print;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct RehearsalWatcher {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RehearsalWatcher {
    /// Deregister the watcher. The poll loop notices the flag within one
    /// interval; aborting as well means we never wait on a signal that
    /// will not arrive.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// Spawn the signal watcher for an active dry-run redirection.
pub fn watch_rehearsal(
    paths: Arc<Mutex<GoPaths>>,
    env: Arc<dyn EnvironmentPort>,
) -> RehearsalWatcher {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let handle = tokio::spawn(async move {
        if poll_for_signal(&stop_flag).await {
            force_restore(&paths, env.as_ref());
            std::process::exit(1);
        }
    });
    RehearsalWatcher { stop, handle }
}

/// Restore the environment from the signal path. `leave_rehearsal` is
/// idempotent, so racing a normal leave is harmless.
pub fn force_restore(paths: &Mutex<GoPaths>, env: &dyn EnvironmentPort) {
    if let Err(err) = paths.lock().unwrap().leave_rehearsal(env) {
        print::err(&format!("can not change dry run mode to normal mode: {err}"));
    }
}

/// Returns true when a termination signal arrived, false when the stop
/// flag was raised first.
#[cfg(unix)]
async fn poll_for_signal(stop: &AtomicBool) -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
        signal(SignalKind::quit()),
    );
    let (Ok(mut sigint), Ok(mut sigterm), Ok(mut sighup), Ok(mut sigquit)) = streams else {
        tracing::warn!("can not register signal handlers for dry run cleanup");
        return false;
    };

    loop {
        tokio::select! {
            _ = sigint.recv() => return true,
            _ = sigterm.recv() => return true,
            _ = sighup.recv() => return true,
            _ = sigquit.recv() => return true,
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn poll_for_signal(stop: &AtomicBool) -> bool {
    loop {
        tokio::select! {
            received = tokio::signal::ctrl_c() => return received.is_ok(),
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
            }
        }
    }
}
