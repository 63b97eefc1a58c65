use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};

use crate::errors::PersistenceError;
use crate::model::configuration::DatabaseSettings;
use crate::model::{Observation, StatsRow};

pub const INSERT_PLAYER_COUNT: &str = r#"
    INSERT INTO steam_stats (appid, player_count)
    VALUES (?, ?)
"#;

pub const INSERT_ERROR: &str = r#"
    INSERT INTO steam_stats (appid, player_count, error_message)
    VALUES (?, NULL, ?)
"#;

/// Where observations end up.
#[async_trait]
pub trait ObservationSink: Send + Sync {
    async fn record(
        &self,
        database: &DatabaseSettings,
        observation: &Observation,
    ) -> Result<(), PersistenceError>;
}

#[async_trait]
impl<T: ObservationSink + ?Sized> ObservationSink for &T {
    async fn record(
        &self,
        database: &DatabaseSettings,
        observation: &Observation,
    ) -> Result<(), PersistenceError> {
        (**self).record(database, observation).await
    }
}

/// Writes every observation with a brand new MySQL connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlRecorder;

#[async_trait]
impl ObservationSink for MySqlRecorder {
    #[tracing::instrument(skip_all, fields(appid = %observation.appid))]
    async fn record(
        &self,
        database: &DatabaseSettings,
        observation: &Observation,
    ) -> Result<(), PersistenceError> {
        let mut connection = connect_options(database)
            .connect()
            .await
            .map_err(PersistenceError::Connect)?;

        let inserted = insert(&mut connection, &StatsRow::from(observation)).await;

        // The connection goes away whatever happened to the insert
        let closed = connection.close().await.map_err(PersistenceError::Close);

        inserted.and(closed)
    }
}

fn connect_options(database: &DatabaseSettings) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&database.host)
        .port(database.port)
        .username(&database.user)
        .password(database.password.expose_secret())
        .database(&database.name)
}

/// Value bound after `appid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound<'r> {
    PlayerCount(Option<i64>),
    ErrorMessage(&'r str),
}

/// Statement and parameters for one row, in placeholder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prepared<'r> {
    pub statement: &'static str,
    pub appid: &'r str,
    pub value: Bound<'r>,
}

/// Count rows leave `error_message` to its default, error rows get a `NULL` count.
pub fn prepare<'r>(row: &'r StatsRow<'_>) -> Prepared<'r> {
    match &row.error_message {
        Some(error_message) => Prepared {
            statement: INSERT_ERROR,
            appid: row.appid,
            value: Bound::ErrorMessage(error_message),
        },
        None => Prepared {
            statement: INSERT_PLAYER_COUNT,
            appid: row.appid,
            value: Bound::PlayerCount(row.player_count),
        },
    }
}

async fn insert(
    connection: &mut MySqlConnection,
    row: &StatsRow<'_>,
) -> Result<(), PersistenceError> {
    let mut txn = connection
        .begin()
        .await
        .map_err(PersistenceError::Statement)?;

    let prepared = prepare(row);
    let query = sqlx::query(prepared.statement).bind(prepared.appid);
    let query = match prepared.value {
        Bound::PlayerCount(player_count) => query.bind(player_count),
        Bound::ErrorMessage(error_message) => query.bind(error_message),
    };

    query
        .execute(&mut *txn)
        .await
        .map_err(PersistenceError::Statement)?;
    txn.commit().await.map_err(PersistenceError::Statement)?;

    Ok(())
}
