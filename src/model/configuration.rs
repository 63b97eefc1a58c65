use std::time::Duration;

use secrecy::Secret;

use crate::errors::ConfigurationError;

pub const DEFAULT_APP_ID: &str = "570";
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Variables without which the service cannot run, in reporting order.
const REQUIRED: [&str; 5] = [
    "STEAM_API_KEY",
    "DB_HOST",
    "DB_USER",
    "DB_PASSWORD",
    "DB_NAME",
];

/// # Service configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Secret<String>,
    /// Steam application to monitor
    pub appid: String,
    pub database: DatabaseSettings,
    /// Pause between two polls
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub name: String,
}

/// Somewhere the settings can be (re)loaded from.
pub trait SettingsSource {
    fn load(&self) -> Result<Settings, ConfigurationError>;
}

impl<T: SettingsSource + ?Sized> SettingsSource for &T {
    fn load(&self) -> Result<Settings, ConfigurationError> {
        (**self).load()
    }
}

/// Reads the settings from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl SettingsSource for ProcessEnvironment {
    fn load(&self) -> Result<Settings, ConfigurationError> {
        Settings::from_lookup(|name| std::env::var(name).ok())
    }
}

impl Settings {
    /// Build the settings from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let missing: Vec<&'static str> = REQUIRED
            .into_iter()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigurationError::Missing(missing));
        }

        let minutes: u64 = parse_or(
            "INTERVAL_MINUTES",
            get("INTERVAL_MINUTES"),
            DEFAULT_INTERVAL_MINUTES,
        )?;
        let seconds = minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigurationError::Invalid {
                name: "INTERVAL_MINUTES",
                value: minutes.to_string(),
            })?;

        let database = DatabaseSettings {
            host: get("DB_HOST").unwrap_or_default(),
            port: parse_or("DB_PORT", get("DB_PORT"), DEFAULT_DB_PORT)?,
            user: get("DB_USER").unwrap_or_default(),
            password: Secret::new(get("DB_PASSWORD").unwrap_or_default()),
            name: get("DB_NAME").unwrap_or_default(),
        };

        Ok(Settings {
            api_key: Secret::new(get("STEAM_API_KEY").unwrap_or_default()),
            appid: get("APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_owned()),
            database,
            interval: Duration::from_secs(seconds),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigurationError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::Invalid { name, value }),
    }
}
