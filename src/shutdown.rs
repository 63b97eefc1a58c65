use std::future::{pending, Future};

use tracing::error;

/// Resolve on Ctrl-C, or SIGTERM where there is such a thing.
///
/// The handlers are installed before this returns: a signal received while
/// the configuration is still loading is seen at the first await that follows.
#[cfg(unix)]
pub fn interrupted() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = listen(signal(SignalKind::interrupt()), "Ctrl-C");
    let terminate = listen(signal(SignalKind::terminate()), "SIGTERM");

    async move {
        tokio::select! {
            _ = interrupt => {},
            _ = terminate => {},
        }
    }
}

#[cfg(unix)]
fn listen(
    signal: std::io::Result<tokio::signal::unix::Signal>,
    name: &'static str,
) -> impl Future<Output = ()> {
    let signal = signal
        .map_err(|err| error!("Could not listen for {name}: {err}"))
        .ok();

    async move {
        match signal {
            Some(mut signal) => {
                signal.recv().await;
            }
            None => pending::<()>().await,
        }
    }
}

#[cfg(not(unix))]
pub fn interrupted() -> impl Future<Output = ()> {
    let ctrl_c = tokio::signal::windows::ctrl_c()
        .map_err(|err| error!("Could not listen for Ctrl-C: {err}"))
        .ok();

    async move {
        match ctrl_c {
            Some(mut ctrl_c) => {
                ctrl_c.recv().await;
            }
            None => pending::<()>().await,
        }
    }
}
