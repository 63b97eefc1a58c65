use std::env::var;

use anyhow::Context;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Build the subscriber: `RUST_LOG` wins over `env_filter`, and `LOG_FORMAT=json`
/// switches the stdout lines to JSON.
pub fn get_subscriber(env_filter: &str) -> impl Subscriber + Sync + Send {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let json = var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    let (json_layer, text_layer) = if json {
        let layer = fmt::Layer::new()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stdout);
        (Some(layer), None)
    } else {
        (None, Some(fmt::Layer::new().with_writer(std::io::stdout)))
    };

    Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}
