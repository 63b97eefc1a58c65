pub mod configuration;

/// Longest error text the `error_message` column accepts, in characters.
pub const ERROR_MESSAGE_MAX_CHARS: usize = 255;

/// Outcome of one player count fetch, destined to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub appid: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    PlayerCount(i64),
    Failure(String),
}

impl Observation {
    pub fn player_count(appid: &str, count: i64) -> Self {
        Observation {
            appid: appid.to_owned(),
            outcome: Outcome::PlayerCount(count),
        }
    }

    pub fn failure(appid: &str, error: impl ToString) -> Self {
        Observation {
            appid: appid.to_owned(),
            outcome: Outcome::Failure(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::PlayerCount(_))
    }
}

/// Row projection of an [`Observation`], as stored in `steam_stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRow<'a> {
    pub appid: &'a str,
    pub player_count: Option<i64>,
    pub error_message: Option<String>,
}

impl<'a> From<&'a Observation> for StatsRow<'a> {
    fn from(observation: &'a Observation) -> Self {
        match &observation.outcome {
            Outcome::PlayerCount(count) => StatsRow {
                appid: &observation.appid,
                player_count: Some(*count),
                error_message: None,
            },
            Outcome::Failure(error) => StatsRow {
                appid: &observation.appid,
                player_count: None,
                error_message: Some(truncate(error, ERROR_MESSAGE_MAX_CHARS)),
            },
        }
    }
}

/// Cut on a character boundary, never inside a UTF-8 sequence.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_owned(),
        None => text.to_owned(),
    }
}
