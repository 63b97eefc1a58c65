use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::database::ObservationSink;
use crate::errors::{ConfigurationError, UnexpectedError};
use crate::model::configuration::{Settings, SettingsSource};
use crate::model::Outcome;
use crate::services::fetching::PlayerCountSource;

/// Pause after a failed iteration or a failed configuration load.
pub const BACKOFF: Duration = Duration::from_secs(60);

/// Where the poller stands. Settings live in the states that need them and
/// are dropped when going back to configuration.
#[derive(Debug)]
enum State {
    Configuring,
    Polling(Settings),
    PollBackoff(Settings),
    RestartBackoff,
    Stopped,
}

pub struct Poller<C, F, R> {
    settings: C,
    fetcher: F,
    recorder: R,
}

impl<C, F, R> Poller<C, F, R>
where
    C: SettingsSource,
    F: PlayerCountSource,
    R: ObservationSink,
{
    pub fn new(settings: C, fetcher: F, recorder: R) -> Self {
        Poller {
            settings,
            fetcher,
            recorder,
        }
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Only missing configuration ends the loop with an error, everything else
    /// is logged and retried after [`BACKOFF`]. Failures inside an iteration
    /// are warnings, failures to load the configuration are errors.
    pub async fn run<S>(&self, shutdown: S) -> Result<(), ConfigurationError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut state = State::Configuring;

        loop {
            state = match state {
                State::Configuring => match self.configure() {
                    Ok(settings) => State::Polling(settings),
                    Err(Some(error)) => return Err(error),
                    Err(None) => {
                        info!("Attempting full restart in {} seconds", BACKOFF.as_secs());
                        State::RestartBackoff
                    }
                },
                State::Polling(settings) => {
                    let iteration = {
                        let body = AssertUnwindSafe(self.poll_once(&settings)).catch_unwind();
                        tokio::select! {
                            biased;
                            _ = shutdown.as_mut() => None,
                            result = body => Some(result),
                        }
                    };

                    match iteration {
                        None => State::Stopped,
                        Some(Ok(())) => State::Polling(settings),
                        Some(Err(payload)) => {
                            let error = UnexpectedError::from_panic(payload);
                            warn!("Error in poll loop: {error}");
                            info!("Restarting poll loop after {} seconds", BACKOFF.as_secs());
                            State::PollBackoff(settings)
                        }
                    }
                }
                State::PollBackoff(settings) => {
                    if pause(shutdown.as_mut(), BACKOFF).await {
                        State::Polling(settings)
                    } else {
                        State::Stopped
                    }
                }
                State::RestartBackoff => {
                    if pause(shutdown.as_mut(), BACKOFF).await {
                        State::Configuring
                    } else {
                        State::Stopped
                    }
                }
                State::Stopped => {
                    info!("Stopped by user");
                    return Ok(());
                }
            };
        }
    }

    /// Load the settings. `Err(Some(_))` must end the process, `Err(None)` asks
    /// for a full restart.
    fn configure(&self) -> Result<Settings, Option<ConfigurationError>> {
        match catch_unwind(AssertUnwindSafe(|| self.settings.load())) {
            Ok(Ok(settings)) => {
                info!("Starting Steam monitoring");
                info!("Monitoring AppID: {}", settings.appid);
                info!("Update interval: {} minutes", settings.interval.as_secs() / 60);
                Ok(settings)
            }
            Ok(Err(error)) if error.is_fatal() => {
                error!("{error}");
                Err(Some(error))
            }
            Ok(Err(error)) => {
                error!("Critical error: {error}");
                Err(None)
            }
            Err(payload) => {
                error!("Critical error: {}", UnexpectedError::from_panic(payload));
                Err(None)
            }
        }
    }

    /// One fetch, one write, one nap.
    async fn poll_once(&self, settings: &Settings) {
        info!("Fetching player count...");
        let observation = self.fetcher.fetch(&settings.api_key, &settings.appid).await;

        match &observation.outcome {
            Outcome::PlayerCount(count) => info!("Current players: {count}"),
            Outcome::Failure(error) => warn!("API error: {error}"),
        }

        match self.recorder.record(&settings.database, &observation).await {
            Ok(()) if observation.is_success() => info!("Data saved to DB"),
            Ok(()) => info!("Error saved to DB"),
            Err(error) => warn!("{error}"),
        }

        info!("Sleeping for {} seconds", settings.interval.as_secs());
        sleep(settings.interval).await;
    }
}

/// Sleep for `duration`, `false` if interrupted in between.
async fn pause<S>(shutdown: Pin<&mut S>, duration: Duration) -> bool
where
    S: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => false,
        _ = sleep(duration) => true,
    }
}
