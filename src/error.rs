/// A single raw record that could not be normalized. Recovered per record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not an integer: {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("field `{0}` has an unexpected type")]
    UnexpectedType(&'static str),

    #[error("timestamp {0} ms is out of range")]
    TimestampOutOfRange(u128),

    #[error("decimals {0} is out of range")]
    DecimalsOutOfRange(u128),
}

/// A page request that failed. Recovered per address: pagination stops.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is not a valid page: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid time `{0}`, expected YYYY-MM-DD[ HH:MM[:SS]]")]
    InvalidTime(String),

    #[error("time window start {start} is after end {end}")]
    InvertedWindow { start: String, end: String },

    #[error("page size must be between 1 and {max}, got {got}")]
    PageSize { got: u32, max: u32 },

    #[error("input table has no `{0}` column")]
    MissingColumn(&'static str),
}
