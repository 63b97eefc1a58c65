use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;

use crate::errors::FetchError;
use crate::model::Observation;

pub const PLAYER_COUNT_ENDPOINT: &str =
    "https://api.steampowered.com/ISteamUserStats/GetNumberOfCurrentPlayers/v1/";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything able to tell how many players an application currently has.
#[async_trait]
pub trait PlayerCountSource: Send + Sync {
    /// Never fails: every problem ends up as a failed [`Observation`].
    async fn fetch(&self, api_key: &Secret<String>, appid: &str) -> Observation;
}

#[async_trait]
impl<T: PlayerCountSource + ?Sized> PlayerCountSource for &T {
    async fn fetch(&self, api_key: &Secret<String>, appid: &str) -> Observation {
        (**self).fetch(api_key, appid).await
    }
}

/// Client of the Steam Web API player count endpoint.
#[derive(Clone)]
pub struct SteamClient {
    client: ClientWithMiddleware,
    endpoint: String,
}

impl SteamClient {
    /// Client hitting the real Steam endpoint.
    pub fn build() -> reqwest::Result<Self> {
        Self::new(PLAYER_COUNT_ENDPOINT, REQUEST_TIMEOUT)
    }

    pub fn new(endpoint: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("steam-stats/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let client = ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();

        Ok(SteamClient {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    async fn get_player_count(
        &self,
        api_key: &Secret<String>,
        appid: &str,
    ) -> Result<i64, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", api_key.expose_secret().as_str()), ("appid", appid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_player_count(&body)
    }
}

#[async_trait]
impl PlayerCountSource for SteamClient {
    #[tracing::instrument(skip(self, api_key))]
    async fn fetch(&self, api_key: &Secret<String>, appid: &str) -> Observation {
        match self.get_player_count(api_key, appid).await {
            Ok(count) => Observation::player_count(appid, count),
            Err(error) => Observation::failure(appid, error),
        }
    }
}

/// Extract `response.player_count` from the API answer.
fn parse_player_count(body: &str) -> Result<i64, FetchError> {
    let data: Value = serde_json::from_str(body)?;

    data.get("response")
        .and_then(|response| response.get("player_count"))
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::InvalidResponse(body.to_owned()))
}
