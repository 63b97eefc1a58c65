use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::error;

use steam_stats::database::MySqlRecorder;
use steam_stats::model::configuration::ProcessEnvironment;
use steam_stats::observability;
use steam_stats::poller::Poller;
use steam_stats::services::fetching::SteamClient;
use steam_stats::shutdown;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let subscriber = observability::get_subscriber("info");
    if let Err(err) = observability::init_subscriber(subscriber) {
        eprintln!("{err:?}");
        return ExitCode::from(1);
    }

    let client = match SteamClient::build() {
        Ok(client) => client,
        Err(err) => {
            error!("Could not build the HTTP client: {err}");
            return ExitCode::from(1);
        }
    };

    // Handlers go in before the first configuration load
    let interrupted = shutdown::interrupted();

    let poller = Poller::new(ProcessEnvironment, client, MySqlRecorder);
    match poller.run(interrupted).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}
