use thiserror::Error;

/// User input that can be rejected before anything is fetched or drawn.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid month `{0}`, expected a two-digit month between 01 and 12")]
    InvalidMonth(String),
    #[error("year {0} is out of the supported calendar range")]
    InvalidYear(i32),
    #[error("unknown vessel type `{0}`")]
    UnknownVesselLabel(String),
    #[error("unknown location type `{0}`")]
    UnknownLocationType(String),
    #[error("metric value {0} cannot be colored, values must be finite and non-negative")]
    InvalidMetricValue(f64),
}

/// A request against the backend did not produce a record array.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// A single record does not have the shape its consumer needs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("field `{field}` is not a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored state is not valid: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("position {index} is out of bounds for {len} pinned entries")]
    OutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{key}` must be {expected}, got `{value}`")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
