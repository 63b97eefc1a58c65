use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::Secret;
use tokio::time::Instant;

use steam_stats::database::ObservationSink;
use steam_stats::errors::{ConfigurationError, PersistenceError};
use steam_stats::model::configuration::{DatabaseSettings, Settings, SettingsSource};
use steam_stats::model::Observation;
use steam_stats::services::fetching::PlayerCountSource;

pub fn settings() -> Settings {
    Settings::from_lookup(|name| {
        let value = match name {
            "STEAM_API_KEY" => "s3cr3t",
            "DB_HOST" => "db.local",
            "DB_USER" => "steam",
            "DB_PASSWORD" => "hunter2",
            "DB_NAME" => "stats",
            "INTERVAL_MINUTES" => "5",
            _ => return None,
        };
        Some(value.to_owned())
    })
    .unwrap()
}

/// Seconds elapsed since `start`, for each recorded instant.
pub fn seconds_since(start: Instant, calls: &[Instant]) -> Vec<u64> {
    calls
        .iter()
        .map(|call| call.duration_since(start).as_secs())
        .collect()
}

pub enum Load {
    Valid,
    Invalid,
    Missing,
    Panic,
}

/// Replays `script`, then keeps answering with valid settings.
pub struct ScriptedSettings {
    script: Mutex<VecDeque<Load>>,
    loads: Mutex<Vec<Instant>>,
}

impl ScriptedSettings {
    pub fn new(script: Vec<Load>) -> Self {
        ScriptedSettings {
            script: Mutex::new(script.into()),
            loads: Mutex::new(vec![]),
        }
    }

    pub fn load_times(&self) -> Vec<Instant> {
        self.loads.lock().unwrap().clone()
    }
}

impl SettingsSource for ScriptedSettings {
    fn load(&self) -> Result<Settings, ConfigurationError> {
        self.loads.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Load::Valid);

        match next {
            Load::Valid => Ok(settings()),
            Load::Invalid => Err(ConfigurationError::Invalid {
                name: "INTERVAL_MINUTES",
                value: "soon".to_owned(),
            }),
            Load::Missing => Err(ConfigurationError::Missing(vec!["STEAM_API_KEY"])),
            Load::Panic => panic!("environment exploded"),
        }
    }
}

pub enum Fetch {
    Count(i64),
    Fail,
    Panic,
}

/// Replays `script`, then keeps answering 1000 players.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Fetch>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Fetch>) -> Self {
        ScriptedFetcher {
            script: Mutex::new(script.into()),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlayerCountSource for ScriptedFetcher {
    async fn fetch(&self, _api_key: &Secret<String>, appid: &str) -> Observation {
        self.calls.lock().unwrap().push(Instant::now());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Fetch::Count(1000));

        match next {
            Fetch::Count(count) => Observation::player_count(appid, count),
            Fetch::Fail => Observation::failure(appid, "Request failed: HTTP status 503"),
            Fetch::Panic => panic!("fetcher exploded"),
        }
    }
}

/// Keeps what it is given, optionally failing every write.
pub struct MemoryRecorder {
    failing: bool,
    recorded: Mutex<Vec<Observation>>,
}

impl MemoryRecorder {
    pub fn working() -> Self {
        MemoryRecorder {
            failing: false,
            recorded: Mutex::new(vec![]),
        }
    }

    pub fn broken() -> Self {
        MemoryRecorder {
            failing: true,
            recorded: Mutex::new(vec![]),
        }
    }

    pub fn recorded(&self) -> Vec<Observation> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObservationSink for MemoryRecorder {
    async fn record(
        &self,
        _database: &DatabaseSettings,
        observation: &Observation,
    ) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Statement(sqlx::Error::PoolClosed));
        }
        self.recorded.lock().unwrap().push(observation.clone());
        Ok(())
    }
}

/// Formatted log lines, kept in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(move || logs.clone())
            .finish()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        let output = self.0.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
