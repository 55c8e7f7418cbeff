//! Termination signal listener.
//!
//! The first termination signal runs the provided callback; any later one falls
//! back to the signal's default action so the process stays killable.

#[cfg(unix)]
use log::{debug, warn};
#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};

#[cfg(unix)]
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGINT, SIGUSR1, SIGUSR2, SIGTERM];

#[cfg(unix)]
pub(super) fn spawn_listener<F>(on_first: F) -> std::io::Result<()>
where
    F: FnOnce(i32) + Send + 'static,
{
    let mut signals = signal_hook::iterator::Signals::new(TERMINATION_SIGNALS)?;

    std::thread::Builder::new()
        .name("mongocrud-signals".into())
        .spawn(move || {
            let mut on_first = Some(on_first);
            for signal in signals.forever() {
                match on_first.take() {
                    Some(callback) => callback(signal),
                    None => {
                        warn!("termination signal {} received again, terminating", signal);
                        if let Err(e) = signal_hook::low_level::emulate_default_handler(signal) {
                            warn!("unable to run default handler for signal {}: {}", signal, e);
                        }
                    }
                }
            }
            debug!("signal listener stopped");
        })?;

    Ok(())
}

#[cfg(not(unix))]
pub(super) fn spawn_listener<F>(_on_first: F) -> std::io::Result<()>
where
    F: FnOnce(i32) + Send + 'static,
{
    log::debug!("termination signals are not handled on this platform");
    Ok(())
}
