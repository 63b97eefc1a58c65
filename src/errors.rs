use std::any::Any;

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl ConfigurationError {
    /// Missing variables end the process, anything else is worth a reload.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigurationError::Missing(_))
    }
}

/// The request URL carries the API key, so it never makes it into a `FetchError`.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(reqwest::Error),
    #[error("Request failed: {0}")]
    Middleware(anyhow::Error),
    #[error("Request failed: HTTP status {0}")]
    Status(u16),
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Request(error.without_url())
    }
}

impl From<reqwest_middleware::Error> for FetchError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Reqwest(error) => error.into(),
            reqwest_middleware::Error::Middleware(error) => FetchError::Middleware(error),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("Could not connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("Database error: {0}")]
    Statement(#[source] sqlx::Error),
    #[error("Could not close the database connection: {0}")]
    Close(#[source] sqlx::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum UnexpectedError {
    #[error("Panicked: {0}")]
    Panic(String),
}

impl UnexpectedError {
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            String::from("unknown panic payload")
        };

        UnexpectedError::Panic(message)
    }
}
